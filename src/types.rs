use std::{
    fmt,
    hash::{Hash, Hasher},
};

use num_bigint::BigInt;
use serde::{Serialize, Serializer};

use crate::{
    error::{Error, Result},
    unit::{UnitType, BYTE_UNIT},
    values::{Decimal, Value, ValueKind},
};

const MAX_BIT_LENGTH: u16 = 256;
const MAX_FIXED_BYTES: usize = 32;
const MAX_DECIMAL_SCALE: u32 = 80;

/// Describes one ABI type: its canonical type string, whether its encoding
/// is dynamic, and the variant-specific layout in [`TypeKind`].
///
/// Descriptors are immutable trees. Equality and hashing only look at the
/// canonical type string.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    canonical_type: String,
    dynamic: bool,
    name: Option<String>,
    kind: TypeKind,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Bool,
    /// Raw byte. Only appears as the element of `bytes`, `bytesN` and `string`.
    Byte,
    /// Integer whose values fit in an `i32`.
    Int(UnitType),
    /// Integer whose values fit in an `i64`.
    Long(UnitType),
    BigInt(UnitType),
    Decimal { unit: UnitType, scale: u32 },
    Array(ArrayType),
    Tuple(TupleType),
}

#[derive(Debug, Clone)]
pub struct ArrayType {
    element_type: Box<TypeDescriptor>,
    length: Option<usize>,
    is_text: bool,
}

impl ArrayType {
    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element_type
    }

    /// Declared length, or `None` for a variable-length array.
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    /// Whether the native value is a `String` rather than a byte vector.
    pub fn is_text(&self) -> bool {
        self.is_text
    }
}

#[derive(Debug, Clone)]
pub struct TupleType {
    components: Vec<TypeDescriptor>,
}

impl TupleType {
    pub fn components(&self) -> &[TypeDescriptor] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl TypeDescriptor {
    fn new(canonical_type: String, dynamic: bool, kind: TypeKind) -> Self {
        TypeDescriptor {
            canonical_type,
            dynamic,
            name: None,
            kind,
        }
    }

    pub fn boolean() -> Self {
        Self::new("bool".to_string(), false, TypeKind::Bool)
    }

    /// Element of `bytes`, `bytesN` and `string`. Its canonical type is
    /// `int8`, so it compares equal to `int(8)` even though the two kinds
    /// differ: equality only looks at the canonical type.
    pub(crate) fn byte() -> Self {
        Self::new("int8".to_string(), false, TypeKind::Byte)
    }

    /// Signed integer type `int<bits>`.
    pub fn int(bits: u16) -> Result<Self> {
        Self::integer(bits, false)
    }

    /// Unsigned integer type `uint<bits>`.
    pub fn uint(bits: u16) -> Result<Self> {
        Self::integer(bits, true)
    }

    fn integer(bits: u16, unsigned: bool) -> Result<Self> {
        let canonical_type = format!("{}int{}", if unsigned { "u" } else { "" }, bits);
        check_bit_length(&canonical_type, bits)?;

        let unit = UnitType::new(bits, unsigned);
        // an unsigned range has to fit the positive half of the native type
        let native_bits = if unsigned { bits + 1 } else { bits };
        let kind = if native_bits <= 32 {
            TypeKind::Int(unit)
        } else if native_bits <= 64 {
            TypeKind::Long(unit)
        } else {
            TypeKind::BigInt(unit)
        };

        Ok(Self::new(canonical_type, false, kind))
    }

    /// Signed fixed-point type `fixed<bits>x<scale>`.
    pub fn fixed(bits: u16, scale: u32) -> Result<Self> {
        Self::decimal(bits, scale, false)
    }

    /// Unsigned fixed-point type `ufixed<bits>x<scale>`.
    pub fn ufixed(bits: u16, scale: u32) -> Result<Self> {
        Self::decimal(bits, scale, true)
    }

    fn decimal(bits: u16, scale: u32, unsigned: bool) -> Result<Self> {
        let canonical_type = format!(
            "{}fixed{}x{}",
            if unsigned { "u" } else { "" },
            bits,
            scale
        );
        check_bit_length(&canonical_type, bits)?;
        if scale > MAX_DECIMAL_SCALE {
            return Err(Error::InvalidType {
                canonical_type,
                reason: "scale must not exceed 80",
            });
        }

        let kind = TypeKind::Decimal {
            unit: UnitType::new(bits, unsigned),
            scale,
        };

        Ok(Self::new(canonical_type, false, kind))
    }

    /// Variable-length byte sequence `bytes`.
    pub fn bytes() -> Self {
        Self::byte_array("bytes".to_string(), None, false)
    }

    /// Fixed-length byte sequence `bytes<len>`.
    pub fn fixed_bytes(len: usize) -> Result<Self> {
        let canonical_type = format!("bytes{}", len);
        if len == 0 || len > MAX_FIXED_BYTES {
            return Err(Error::InvalidType {
                canonical_type,
                reason: "byte width must be between 1 and 32",
            });
        }
        Ok(Self::byte_array(canonical_type, Some(len), false))
    }

    /// UTF-8 text `string`.
    pub fn string() -> Self {
        Self::byte_array("string".to_string(), None, true)
    }

    fn byte_array(canonical_type: String, length: Option<usize>, is_text: bool) -> Self {
        let array = ArrayType {
            element_type: Box::new(Self::byte()),
            length,
            is_text,
        };
        Self::new(canonical_type, length.is_none(), TypeKind::Array(array))
    }

    /// Variable-length array `<element>[]`.
    pub fn dynamic_array(element_type: TypeDescriptor) -> Self {
        Self::array(element_type, None)
    }

    /// Fixed-length array `<element>[len]`.
    pub fn fixed_array(element_type: TypeDescriptor, len: usize) -> Self {
        Self::array(element_type, Some(len))
    }

    fn array(element_type: TypeDescriptor, length: Option<usize>) -> Self {
        let canonical_type = match length {
            Some(len) => format!("{}[{}]", element_type.canonical_type, len),
            None => format!("{}[]", element_type.canonical_type),
        };
        let dynamic = length.is_none() || element_type.dynamic;
        let array = ArrayType {
            element_type: Box::new(element_type),
            length,
            is_text: false,
        };

        Self::new(canonical_type, dynamic, TypeKind::Array(array))
    }

    pub fn tuple(components: Vec<TypeDescriptor>) -> Self {
        let canonical_type = format!(
            "({})",
            components
                .iter()
                .map(|c| c.canonical_type.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        let dynamic = components.iter().any(|c| c.dynamic);

        Self::new(canonical_type, dynamic, TypeKind::Tuple(TupleType { components }))
    }

    /// Labels this type as a named tuple component.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn canonical_type(&self) -> &str {
        &self.canonical_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Range of an atomic type. `None` for arrays and tuples.
    pub fn unit(&self) -> Option<UnitType> {
        match &self.kind {
            TypeKind::Bool => Some(UnitType::new(1, true)),
            TypeKind::Byte => Some(BYTE_UNIT),
            TypeKind::Int(unit) | TypeKind::Long(unit) | TypeKind::BigInt(unit) => Some(*unit),
            TypeKind::Decimal { unit, .. } => Some(*unit),
            TypeKind::Array(_) | TypeKind::Tuple(_) => None,
        }
    }

    /// The kind of native value this type encodes and decodes.
    pub fn value_kind(&self) -> ValueKind {
        match &self.kind {
            TypeKind::Bool => ValueKind::Bool,
            TypeKind::Byte => ValueKind::Byte,
            TypeKind::Int(_) => ValueKind::Int,
            TypeKind::Long(_) => ValueKind::Long,
            TypeKind::BigInt(_) => ValueKind::BigInt,
            TypeKind::Decimal { .. } => ValueKind::Decimal,
            TypeKind::Array(array) => match array.element_type.kind {
                TypeKind::Bool => ValueKind::Bools,
                TypeKind::Byte if array.is_text => ValueKind::String,
                TypeKind::Byte => ValueKind::Bytes,
                TypeKind::Int(_) => ValueKind::Ints,
                TypeKind::Long(_) => ValueKind::Longs,
                TypeKind::BigInt(_) => ValueKind::BigInts,
                TypeKind::Decimal { .. } => ValueKind::Decimals,
                TypeKind::Array(_) | TypeKind::Tuple(_) => ValueKind::Array,
            },
            TypeKind::Tuple(_) => ValueKind::Tuple,
        }
    }

    /// Value whose encoding is all zero words: `false`, `0`, empty
    /// variable-length arrays and fixed-length arrays of zero elements.
    pub fn zero_value(&self) -> Value {
        match &self.kind {
            TypeKind::Bool => Value::Bool(false),
            TypeKind::Byte => Value::Byte(0),
            TypeKind::Int(_) => Value::Int(0),
            TypeKind::Long(_) => Value::Long(0),
            TypeKind::BigInt(_) => Value::BigInt(BigInt::from(0)),
            TypeKind::Decimal { scale, .. } => Value::Decimal(Decimal::new(0, *scale)),
            TypeKind::Array(array) => {
                let len = array.length.unwrap_or(0);
                match &array.element_type.kind {
                    TypeKind::Bool => Value::Bools(vec![false; len]),
                    TypeKind::Byte if array.is_text => Value::String(String::new()),
                    TypeKind::Byte => Value::Bytes(vec![0; len]),
                    TypeKind::Int(_) => Value::Ints(vec![0; len]),
                    TypeKind::Long(_) => Value::Longs(vec![0; len]),
                    TypeKind::BigInt(_) => Value::BigInts(vec![BigInt::from(0); len]),
                    TypeKind::Decimal { scale, .. } => {
                        Value::Decimals(vec![Decimal::new(0, *scale); len])
                    }
                    TypeKind::Array(_) | TypeKind::Tuple(_) => {
                        Value::Array(vec![array.element_type.zero_value(); len])
                    }
                }
            }
            TypeKind::Tuple(tuple) => {
                Value::Tuple(tuple.components.iter().map(Self::zero_value).collect())
            }
        }
    }

    pub(crate) fn check_kind(&self, value: &Value) -> Result<()> {
        let expected = self.value_kind();
        let found = value.kind();
        if expected != found {
            return Err(Error::ClassMismatch {
                canonical_type: self.canonical_type.clone(),
                expected,
                found,
            });
        }
        Ok(())
    }

    pub(crate) fn kind_mismatch(&self, value: &Value) -> Error {
        Error::ClassMismatch {
            canonical_type: self.canonical_type.clone(),
            expected: self.value_kind(),
            found: value.kind(),
        }
    }
}

fn check_bit_length(canonical_type: &str, bits: u16) -> Result<()> {
    if bits == 0 || bits > MAX_BIT_LENGTH || bits % 8 != 0 {
        return Err(Error::InvalidType {
            canonical_type: canonical_type.to_string(),
            reason: "bit length must be a multiple of 8 between 8 and 256",
        });
    }
    Ok(())
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_type == other.canonical_type
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_type.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_type)
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.canonical_type)
    }
}
