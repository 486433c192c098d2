use std::iter;

use log::debug;

use crate::{
    error::Result,
    types::{ArrayType, TypeDescriptor, TypeKind},
    unit::{
        big_int_word, bool_word, length_word, long_word, round_up_32, UnitType, UNIT_LENGTH_BYTES,
    },
    values::Value,
};

impl TypeDescriptor {
    /// Validates `value` and returns its padded ABI encoding.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let mut out = vec![];
        self.encode_into(value, &mut out)?;
        Ok(out)
    }

    /// Validates `value` and appends its padded ABI encoding to `out`,
    /// returning the number of bytes written.
    pub fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<usize> {
        let len = self.validate(value)?;
        out.reserve(len);
        self.write(value, out)?;

        debug!("encoded {} into {} bytes", self.canonical_type(), len);

        Ok(len)
    }

    fn write(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        match (self.kind(), value) {
            (TypeKind::Bool, Value::Bool(b)) => out.extend_from_slice(&bool_word(*b)),
            (TypeKind::Byte, Value::Byte(b)) => out.extend_from_slice(&long_word(*b as i64)),
            (TypeKind::Int(_), Value::Int(i)) => out.extend_from_slice(&long_word(*i as i64)),
            (TypeKind::Long(_), Value::Long(l)) => out.extend_from_slice(&long_word(*l)),
            (TypeKind::BigInt(_), Value::BigInt(bi)) => out.extend_from_slice(&big_int_word(bi)?),
            (TypeKind::Decimal { .. }, Value::Decimal(d)) => {
                out.extend_from_slice(&big_int_word(d.unscaled())?)
            }
            (TypeKind::Array(array), _) => self.write_array(array, value, out)?,
            (TypeKind::Tuple(tuple), _) => {
                let values = self.tuple_values(tuple, value)?;
                write_sequence(tuple.components().iter().zip(values), out)?;
            }
            _ => return Err(self.kind_mismatch(value)),
        }

        Ok(())
    }

    fn write_array(&self, array: &ArrayType, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        let element_type = array.element_type();

        match (element_type.kind(), value) {
            (TypeKind::Bool, Value::Bools(v)) => {
                self.write_count(v.len(), out);
                v.iter().for_each(|b| out.extend_from_slice(&bool_word(*b)));
            }
            (TypeKind::Byte, Value::Bytes(b)) if !array.is_text() => {
                self.write_count(b.len(), out);
                write_padded(b, out);
            }
            (TypeKind::Byte, Value::String(s)) if array.is_text() => {
                self.write_count(s.len(), out);
                write_padded(s.as_bytes(), out);
            }
            (TypeKind::Int(_), Value::Ints(v)) => {
                self.write_count(v.len(), out);
                v.iter()
                    .for_each(|i| out.extend_from_slice(&long_word(*i as i64)));
            }
            (TypeKind::Long(_), Value::Longs(v)) => {
                self.write_count(v.len(), out);
                v.iter().for_each(|l| out.extend_from_slice(&long_word(*l)));
            }
            (TypeKind::BigInt(_), Value::BigInts(v)) => {
                self.write_count(v.len(), out);
                for (i, bi) in v.iter().enumerate() {
                    out.extend_from_slice(&big_int_word(bi).map_err(|e| e.at(i))?);
                }
            }
            (TypeKind::Decimal { .. }, Value::Decimals(v)) => {
                self.write_count(v.len(), out);
                for (i, d) in v.iter().enumerate() {
                    out.extend_from_slice(&big_int_word(d.unscaled()).map_err(|e| e.at(i))?);
                }
            }
            (TypeKind::Array(_) | TypeKind::Tuple(_), Value::Array(elements)) => {
                self.write_count(elements.len(), out);
                write_sequence(iter::repeat(element_type).zip(elements), out)?;
            }
            _ => return Err(self.kind_mismatch(value)),
        }

        Ok(())
    }

    fn write_count(&self, len: usize, out: &mut Vec<u8>) {
        if self.is_dynamic() {
            out.extend_from_slice(&length_word(len));
        }
    }

    /// Validates `value` and returns its packed encoding.
    pub fn encode_packed(&self, value: &Value) -> Result<Vec<u8>> {
        self.validate(value)?;

        let mut out = Vec::with_capacity(self.byte_length_packed(value)?);
        self.write_packed(value, &mut out)?;
        Ok(out)
    }

    fn write_packed(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        match (self.kind(), value) {
            (TypeKind::Bool, Value::Bool(b)) => out.push(*b as u8),
            (TypeKind::Byte, Value::Byte(b)) => out.push(*b as u8),
            (TypeKind::Int(unit), Value::Int(i)) => {
                write_packed_word(&long_word(*i as i64), unit, out)
            }
            (TypeKind::Long(unit), Value::Long(l)) => write_packed_word(&long_word(*l), unit, out),
            (TypeKind::BigInt(unit), Value::BigInt(bi)) => {
                write_packed_word(&big_int_word(bi)?, unit, out)
            }
            (TypeKind::Decimal { unit, .. }, Value::Decimal(d)) => {
                write_packed_word(&big_int_word(d.unscaled())?, unit, out)
            }
            (TypeKind::Array(array), _) => self.write_array_packed(array, value, out)?,
            (TypeKind::Tuple(tuple), _) => {
                let values = self.tuple_values(tuple, value)?;
                for (i, (component, value)) in tuple.components().iter().zip(values).enumerate() {
                    component.write_packed(value, out).map_err(|e| e.at(i))?;
                }
            }
            _ => return Err(self.kind_mismatch(value)),
        }

        Ok(())
    }

    fn write_array_packed(
        &self,
        array: &ArrayType,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let element_type = array.element_type();

        match (element_type.kind(), value) {
            (TypeKind::Bool, Value::Bools(v)) => out.extend(v.iter().map(|b| *b as u8)),
            (TypeKind::Byte, Value::Bytes(b)) if !array.is_text() => out.extend_from_slice(b),
            (TypeKind::Byte, Value::String(s)) if array.is_text() => {
                out.extend_from_slice(s.as_bytes())
            }
            (TypeKind::Int(unit), Value::Ints(v)) => v
                .iter()
                .for_each(|i| write_packed_word(&long_word(*i as i64), unit, out)),
            (TypeKind::Long(unit), Value::Longs(v)) => v
                .iter()
                .for_each(|l| write_packed_word(&long_word(*l), unit, out)),
            (TypeKind::BigInt(unit), Value::BigInts(v)) => {
                for (i, bi) in v.iter().enumerate() {
                    write_packed_word(&big_int_word(bi).map_err(|e| e.at(i))?, unit, out);
                }
            }
            (TypeKind::Decimal { unit, .. }, Value::Decimals(v)) => {
                for (i, d) in v.iter().enumerate() {
                    let word = big_int_word(d.unscaled()).map_err(|e| e.at(i))?;
                    write_packed_word(&word, unit, out);
                }
            }
            (TypeKind::Array(_) | TypeKind::Tuple(_), Value::Array(elements)) => {
                for (i, element) in elements.iter().enumerate() {
                    element_type.write_packed(element, out).map_err(|e| e.at(i))?;
                }
            }
            _ => return Err(self.kind_mismatch(value)),
        }

        Ok(())
    }
}

/// Writes an ordered run of slots: the head holds static encodings in place
/// and an offset word for each dynamic slot, the tail holds the dynamic
/// encodings in declaration order. Offsets count from the start of the head
/// and are filled in as each tail is written.
fn write_sequence<'a, I>(slots: I, out: &mut Vec<u8>) -> Result<()>
where
    I: Iterator<Item = (&'a TypeDescriptor, &'a Value)> + Clone,
{
    let head_start = out.len();
    let mut offset_slots = vec![];

    for (i, (ty, value)) in slots.clone().enumerate() {
        if ty.is_dynamic() {
            offset_slots.push(out.len());
            out.extend_from_slice(&[0u8; UNIT_LENGTH_BYTES]);
        } else {
            ty.write(value, out).map_err(|e| e.at(i))?;
        }
    }

    let dynamic_slots = slots.enumerate().filter(|(_, (ty, _))| ty.is_dynamic());
    for ((i, (ty, value)), slot) in dynamic_slots.zip(offset_slots) {
        let offset = out.len() - head_start;
        out[slot..slot + UNIT_LENGTH_BYTES].copy_from_slice(&length_word(offset));

        ty.write(value, out).map_err(|e| e.at(i))?;
    }

    Ok(())
}

/// Left-aligned bytes, zero-padded to a word boundary.
fn write_padded(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes);
    out.resize(out.len() + round_up_32(bytes.len()) - bytes.len(), 0);
}

fn write_packed_word(word: &[u8; UNIT_LENGTH_BYTES], unit: &UnitType, out: &mut Vec<u8>) {
    out.extend_from_slice(&word[UNIT_LENGTH_BYTES - unit.packed_length()..]);
}
