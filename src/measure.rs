use crate::{
    error::{Error, Result},
    types::{ArrayType, TupleType, TypeDescriptor, TypeKind},
    unit::{round_up_32, LOG_2_UNIT_LENGTH_BYTES, UNIT_LENGTH_BYTES},
    values::Value,
};

impl TypeDescriptor {
    /// Number of bytes `value` occupies in the padded encoding. Does not
    /// check numeric ranges; see [`TypeDescriptor::validate`].
    pub fn byte_length(&self, value: &Value) -> Result<usize> {
        match self.kind() {
            TypeKind::Array(array) => self.array_byte_length(array, value),
            TypeKind::Tuple(tuple) => self.tuple_byte_length(tuple, value),
            _ => {
                self.check_kind(value)?;
                Ok(UNIT_LENGTH_BYTES)
            }
        }
    }

    fn array_byte_length(&self, array: &ArrayType, value: &Value) -> Result<usize> {
        let element_type = array.element_type();

        let static_len = match (element_type.kind(), value) {
            (TypeKind::Bool, Value::Bools(v)) => v.len() << LOG_2_UNIT_LENGTH_BYTES,
            (TypeKind::Byte, Value::Bytes(b)) if !array.is_text() => round_up_32(b.len()),
            (TypeKind::Byte, Value::String(s)) if array.is_text() => round_up_32(s.len()),
            (TypeKind::Int(_), Value::Ints(v)) => v.len() << LOG_2_UNIT_LENGTH_BYTES,
            (TypeKind::Long(_), Value::Longs(v)) => v.len() << LOG_2_UNIT_LENGTH_BYTES,
            (TypeKind::BigInt(_), Value::BigInts(v)) => v.len() << LOG_2_UNIT_LENGTH_BYTES,
            (TypeKind::Decimal { .. }, Value::Decimals(v)) => v.len() << LOG_2_UNIT_LENGTH_BYTES,
            (TypeKind::Array(_) | TypeKind::Tuple(_), Value::Array(elements)) => {
                // one offset word per element when the elements are dynamic
                let offsets = if element_type.is_dynamic() {
                    elements.len() << LOG_2_UNIT_LENGTH_BYTES
                } else {
                    0
                };

                elements
                    .iter()
                    .enumerate()
                    .try_fold(offsets, |len, (i, element)| {
                        element_type
                            .byte_length(element)
                            .map(|element_len| len + element_len)
                            .map_err(|e| e.at(i))
                    })?
            }
            _ => return Err(self.kind_mismatch(value)),
        };

        // dynamic arrays carry an element-count word
        Ok(if self.is_dynamic() {
            UNIT_LENGTH_BYTES + static_len
        } else {
            static_len
        })
    }

    fn tuple_byte_length(&self, tuple: &TupleType, value: &Value) -> Result<usize> {
        let values = self.tuple_values(tuple, value)?;

        tuple
            .components()
            .iter()
            .zip(values)
            .enumerate()
            .try_fold(0, |len, (i, (component, value))| {
                let component_len = component.byte_length(value).map_err(|e| e.at(i))?;
                let head = if component.is_dynamic() {
                    UNIT_LENGTH_BYTES
                } else {
                    0
                };

                Ok(len + head + component_len)
            })
    }

    /// Bytes this type takes in the head of an enclosing sequence: an offset
    /// word when dynamic, otherwise the full static encoding, which may be 0
    /// for empty tuples and zero-length arrays.
    pub(crate) fn head_byte_length(&self) -> usize {
        if self.is_dynamic() {
            return UNIT_LENGTH_BYTES;
        }

        match self.kind() {
            TypeKind::Array(array) => match (array.element_type().kind(), array.length()) {
                (TypeKind::Byte, Some(len)) => round_up_32(len),
                (_, Some(len)) => len.saturating_mul(array.element_type().head_byte_length()),
                (_, None) => UNIT_LENGTH_BYTES,
            },
            TypeKind::Tuple(tuple) => tuple
                .components()
                .iter()
                .fold(0, |len, component| len.saturating_add(component.head_byte_length())),
            _ => UNIT_LENGTH_BYTES,
        }
    }

    /// Number of bytes `value` occupies in the packed encoding: no padding,
    /// no offsets and no count words.
    pub fn byte_length_packed(&self, value: &Value) -> Result<usize> {
        match self.kind() {
            TypeKind::Bool | TypeKind::Byte => {
                self.check_kind(value)?;
                Ok(1)
            }
            TypeKind::Int(unit) | TypeKind::Long(unit) | TypeKind::BigInt(unit) => {
                self.check_kind(value)?;
                Ok(unit.packed_length())
            }
            TypeKind::Decimal { unit, .. } => {
                self.check_kind(value)?;
                Ok(unit.packed_length())
            }
            TypeKind::Array(array) => self.array_byte_length_packed(array, value),
            TypeKind::Tuple(tuple) => {
                let values = self.tuple_values(tuple, value)?;

                tuple
                    .components()
                    .iter()
                    .zip(values)
                    .enumerate()
                    .try_fold(0, |len, (i, (component, value))| {
                        component
                            .byte_length_packed(value)
                            .map(|component_len| len + component_len)
                            .map_err(|e| e.at(i))
                    })
            }
        }
    }

    fn array_byte_length_packed(&self, array: &ArrayType, value: &Value) -> Result<usize> {
        let element_type = array.element_type();
        let element_len = element_type
            .unit()
            .map(|unit| unit.packed_length())
            .unwrap_or_default();

        match (element_type.kind(), value) {
            (TypeKind::Bool, Value::Bools(v)) => Ok(v.len()),
            (TypeKind::Byte, Value::Bytes(b)) if !array.is_text() => Ok(b.len()),
            (TypeKind::Byte, Value::String(s)) if array.is_text() => Ok(s.len()),
            (TypeKind::Int(_), Value::Ints(v)) => Ok(v.len() * element_len),
            (TypeKind::Long(_), Value::Longs(v)) => Ok(v.len() * element_len),
            (TypeKind::BigInt(_), Value::BigInts(v)) => Ok(v.len() * element_len),
            (TypeKind::Decimal { .. }, Value::Decimals(v)) => Ok(v.len() * element_len),
            (TypeKind::Array(_) | TypeKind::Tuple(_), Value::Array(elements)) => elements
                .iter()
                .enumerate()
                .try_fold(0, |len, (i, element)| {
                    element_type
                        .byte_length_packed(element)
                        .map(|element_len| len + element_len)
                        .map_err(|e| e.at(i))
                }),
            _ => Err(self.kind_mismatch(value)),
        }
    }

    /// The component values of a tuple value, checked for arity.
    pub(crate) fn tuple_values<'v>(
        &self,
        tuple: &TupleType,
        value: &'v Value,
    ) -> Result<&'v [Value]> {
        let values = match value {
            Value::Tuple(values) => values,
            _ => return Err(self.kind_mismatch(value)),
        };

        if values.len() != tuple.len() {
            return Err(Error::LengthMismatch {
                canonical_type: self.canonical_type().to_string(),
                expected: tuple.len(),
                found: values.len(),
            });
        }

        Ok(values.as_slice())
    }
}
