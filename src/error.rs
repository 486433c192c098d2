use std::str::Utf8Error;

use thiserror::Error;

use crate::values::ValueKind;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while measuring, validating, encoding or decoding values.
///
/// Failures inside arrays and tuples are wrapped in [`Error::Index`], so a
/// nested failure reads as a path of indices down to the offending element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("class mismatch: {found} not assignable to {expected} ({canonical_type})")]
    ClassMismatch {
        canonical_type: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("{canonical_type} expects {expected} elements but found {found}")]
    LengthMismatch {
        canonical_type: String,
        expected: usize,
        found: usize,
    },

    #[error("exceeds bit limit: {bit_length} > {limit}")]
    BitLengthExceeded { bit_length: u64, limit: u16 },

    #[error("negative value for unsigned type")]
    NegativeForUnsigned,

    #[error("unexpected scale: {found} != {expected}")]
    ScaleMismatch { expected: u32, found: u32 },

    #[error("illegal boolean value @ {position}")]
    MalformedBoolean { position: usize },

    #[error("array length mismatch @ {position}: actual != expected: {actual} != {expected}")]
    ArrayLengthMismatch {
        position: usize,
        actual: usize,
        expected: usize,
    },

    #[error("{operation} is not supported by {canonical_type}")]
    UnsupportedOperation {
        operation: &'static str,
        canonical_type: String,
    },

    #[error("buffer underflow @ {position}: needed {needed} bytes, {remaining} remaining")]
    BufferUnderflow {
        position: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid utf-8 text: {0}")]
    InvalidUtf8(Utf8Error),

    #[error("invalid {canonical_type} literal {literal:?}")]
    InvalidLiteral {
        canonical_type: String,
        literal: String,
    },

    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid type {canonical_type}: {reason}")]
    InvalidType {
        canonical_type: String,
        reason: &'static str,
    },

    #[error("index {index}: {source}")]
    Index { index: usize, source: Box<Error> },
}

impl Error {
    /// Wraps this error as the failure of the child at `index`.
    pub(crate) fn at(self, index: usize) -> Error {
        Error::Index {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost cause, with every index annotation stripped.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Error::Index { source, .. } = err {
            err = source;
        }
        err
    }

    /// Child indices from the outermost composite down to the failing element.
    pub fn path(&self) -> Vec<usize> {
        let mut path = vec![];
        let mut err = self;
        while let Error::Index { index, source } = err {
            path.push(*index);
            err = source;
        }
        path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn index_path() {
        let err = Error::NegativeForUnsigned.at(4).at(1);

        assert_eq!(err.path(), vec![1, 4]);
        assert_eq!(err.root(), &Error::NegativeForUnsigned);
        assert_eq!(
            err.to_string(),
            "index 1: index 4: negative value for unsigned type"
        );
    }

    #[test]
    fn root_of_plain_error() {
        let err = Error::MalformedBoolean { position: 31 };

        assert!(err.path().is_empty());
        assert_eq!(err.root(), &err);
    }
}
