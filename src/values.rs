use std::fmt;

use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};

/// A native value to be encoded, or the result of decoding.
///
/// Arrays of atomic elements are held as plain vectors (`Ints`, `Longs`, ...)
/// so they can be validated and encoded without wrapping every element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    Int(i32),
    Long(i64),
    BigInt(BigInt),
    Decimal(Decimal),
    Bools(Vec<bool>),
    Bytes(Vec<u8>),
    String(String),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    BigInts(Vec<BigInt>),
    Decimals(Vec<Decimal>),
    /// Array whose elements are themselves arrays or tuples.
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Byte(_) => ValueKind::Byte,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::BigInt(_) => ValueKind::BigInt,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Bools(_) => ValueKind::Bools,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::String(_) => ValueKind::String,
            Value::Ints(_) => ValueKind::Ints,
            Value::Longs(_) => ValueKind::Longs,
            Value::BigInts(_) => ValueKind::BigInts,
            Value::Decimals(_) => ValueKind::Decimals,
            Value::Array(_) => ValueKind::Array,
            Value::Tuple(_) => ValueKind::Tuple,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Long(l)
    }
}

impl From<BigInt> for Value {
    fn from(bi: BigInt) -> Self {
        Value::BigInt(bi)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Runtime kind of a [`Value`], used to check a value against the kind a
/// type descriptor expects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Byte,
    Int,
    Long,
    BigInt,
    Decimal,
    Bools,
    Bytes,
    String,
    Ints,
    Longs,
    BigInts,
    Decimals,
    Array,
    Tuple,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Byte => "i8",
            ValueKind::Int => "i32",
            ValueKind::Long => "i64",
            ValueKind::BigInt => "BigInt",
            ValueKind::Decimal => "Decimal",
            ValueKind::Bools => "Vec<bool>",
            ValueKind::Bytes => "Vec<u8>",
            ValueKind::String => "String",
            ValueKind::Ints => "Vec<i32>",
            ValueKind::Longs => "Vec<i64>",
            ValueKind::BigInts => "Vec<BigInt>",
            ValueKind::Decimals => "Vec<Decimal>",
            ValueKind::Array => "Vec<Value>",
            ValueKind::Tuple => "Tuple",
        };

        f.write_str(name)
    }
}

/// Fixed-point decimal: an unscaled integer and the number of digits after
/// the decimal point.
///
/// Equality is exact: `1.0` (unscaled 10, scale 1) and `1.00` (unscaled 100,
/// scale 2) are different values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
    unscaled: BigInt,
    scale: u32,
}

impl Decimal {
    pub fn new(unscaled: impl Into<BigInt>, scale: u32) -> Self {
        Decimal {
            unscaled: unscaled.into(),
            scale,
        }
    }

    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.magnitude().to_str_radix(10);
        let scale = self.scale as usize;

        if self.unscaled.sign() == Sign::Minus {
            f.write_str("-")?;
        }

        if scale == 0 {
            return f.write_str(&digits);
        }

        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);

        write!(f, "{}.{}", int_part, frac_part)
    }
}
