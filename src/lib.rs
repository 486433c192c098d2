mod decode;
mod encode;
mod error;
mod measure;
mod parse;
mod types;
mod unit;
mod validate;
mod values;

pub use decode::{DecodeMode, Decoder};
pub use error::{Error, Result};
pub use types::*;
pub use unit::{round_up_32, Magnitude, UnitType, UNIT_LENGTH_BYTES};
pub use values::*;
