use std::iter;

use log::{debug, trace};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{ArrayType, TypeDescriptor, TypeKind},
    unit::{
        round_up_32, word_to_length, Magnitude, UnitType, BYTE_UNIT, UNIT_LENGTH_BYTES,
    },
    values::{Decimal, Value},
};

/// How the tails of dynamic elements are located while decoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DecodeMode {
    /// Tails are read back to back right after the head, in declaration
    /// order. Recorded offsets are read but not followed.
    #[default]
    Strict,
}

/// Read cursor over an encoded buffer.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    position: usize,
    mode: DecodeMode,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder {
            buf,
            position: 0,
            mode: DecodeMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }

    fn require(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(Error::BufferUnderflow {
                position: self.position,
                needed,
                remaining,
            });
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.require(len)?;

        let bytes = &self.buf[self.position..self.position + len];
        self.position += len;

        Ok(bytes)
    }

    fn read_unit(&mut self, unit: &mut [u8; UNIT_LENGTH_BYTES]) -> Result<()> {
        unit.copy_from_slice(self.take(UNIT_LENGTH_BYTES)?);
        Ok(())
    }

    fn read_length(&mut self, unit: &mut [u8; UNIT_LENGTH_BYTES]) -> Result<usize> {
        self.read_unit(unit)?;
        word_to_length(unit)
    }

    fn enter_tail(&mut self, head_start: usize, offset: usize) {
        match self.mode {
            DecodeMode::Strict => {
                if self.position != head_start + offset {
                    trace!(
                        "reading tail @ {}, recorded offset points to {}",
                        self.position,
                        head_start + offset
                    );
                }
            }
        }
    }
}

enum Head {
    Decoded(Value),
    Offset(usize),
}

impl TypeDescriptor {
    /// Decodes one value of this type from the start of `bytes`. Trailing
    /// bytes are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let mut unit = [0u8; UNIT_LENGTH_BYTES];
        self.decode_with(&mut Decoder::new(bytes), &mut unit)
    }

    /// Decodes from a hex string, with or without a `0x` prefix.
    pub fn decode_hex(&self, s: &str) -> Result<Value> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        self.decode(&bytes)
    }

    /// Decodes one value at the decoder's position. `unit` is scratch space
    /// for the word being read.
    pub fn decode_with(
        &self,
        decoder: &mut Decoder<'_>,
        unit: &mut [u8; UNIT_LENGTH_BYTES],
    ) -> Result<Value> {
        trace!("decoding {} @ {}", self.canonical_type(), decoder.position());

        match self.kind() {
            TypeKind::Bool => read_bool(decoder, unit).map(Value::Bool),
            TypeKind::Byte => {
                let bi = read_big_int(decoder, unit, &BYTE_UNIT, false)?;
                narrow(&bi, &BYTE_UNIT, BigInt::to_i8).map(Value::Byte)
            }
            TypeKind::Int(ty) => {
                let bi = read_big_int(decoder, unit, ty, false)?;
                narrow(&bi, ty, BigInt::to_i32).map(Value::Int)
            }
            TypeKind::Long(ty) => {
                let bi = read_big_int(decoder, unit, ty, false)?;
                narrow(&bi, ty, BigInt::to_i64).map(Value::Long)
            }
            TypeKind::BigInt(ty) => read_big_int(decoder, unit, ty, false).map(Value::BigInt),
            TypeKind::Decimal { unit: ty, scale } => read_big_int(decoder, unit, ty, false)
                .map(|bi| Value::Decimal(Decimal::new(bi, *scale))),
            TypeKind::Array(array) => self.decode_array(array, decoder, unit),
            TypeKind::Tuple(tuple) => {
                read_sequence(tuple.components().iter(), decoder, unit, false).map(Value::Tuple)
            }
        }
    }

    fn decode_array(
        &self,
        array: &ArrayType,
        decoder: &mut Decoder<'_>,
        unit: &mut [u8; UNIT_LENGTH_BYTES],
    ) -> Result<Value> {
        let len = match array.length() {
            Some(len) if !self.is_dynamic() => len,
            expected => {
                let position = decoder.position();
                let actual = decoder.read_length(unit)?;
                if let Some(expected) = expected {
                    if actual != expected {
                        return Err(Error::ArrayLengthMismatch {
                            position,
                            actual,
                            expected,
                        });
                    }
                }
                actual
            }
        };

        let element_type = array.element_type();

        match element_type.kind() {
            TypeKind::Bool => read_elements(decoder, len, |d| read_bool(d, unit)).map(Value::Bools),
            TypeKind::Byte => {
                let bytes = decoder.take(len)?.to_vec();
                decoder.take(round_up_32(len) - len)?;

                if array.is_text() {
                    String::from_utf8(bytes)
                        .map(Value::String)
                        .map_err(|e| Error::InvalidUtf8(e.utf8_error()))
                } else {
                    Ok(Value::Bytes(bytes))
                }
            }
            TypeKind::Int(ty) => read_elements(decoder, len, |d| {
                let bi = read_big_int(d, unit, ty, true)?;
                narrow(&bi, ty, BigInt::to_i32)
            })
            .map(Value::Ints),
            TypeKind::Long(ty) => read_elements(decoder, len, |d| {
                let bi = read_big_int(d, unit, ty, true)?;
                narrow(&bi, ty, BigInt::to_i64)
            })
            .map(Value::Longs),
            TypeKind::BigInt(ty) => {
                read_elements(decoder, len, |d| read_big_int(d, unit, ty, true)).map(Value::BigInts)
            }
            TypeKind::Decimal { unit: ty, scale } => read_elements(decoder, len, |d| {
                read_big_int(d, unit, ty, true).map(|bi| Decimal::new(bi, *scale))
            })
            .map(Value::Decimals),
            TypeKind::Array(_) | TypeKind::Tuple(_) => {
                // Zero-width elements still count one byte each, so a count
                // word can never claim more elements than the input has bytes.
                if self.is_dynamic() {
                    let head_len = element_type.head_byte_length().max(1);
                    decoder.require(len.saturating_mul(head_len))?;
                }

                read_sequence(iter::repeat(element_type).take(len), decoder, unit, true)
                    .map(Value::Array)
            }
        }
    }
}

/// Reads an ordered run of slots laid out as a head followed by the tails of
/// its dynamic slots. With `zero_offset_absent`, a dynamic slot whose offset
/// word is 0 has no tail and decodes to its type's zero value.
fn read_sequence<'t, I>(
    slots: I,
    decoder: &mut Decoder<'_>,
    unit: &mut [u8; UNIT_LENGTH_BYTES],
    zero_offset_absent: bool,
) -> Result<Vec<Value>>
where
    I: Iterator<Item = &'t TypeDescriptor> + Clone,
{
    let head_start = decoder.position();

    let capacity = slots
        .size_hint()
        .0
        .min(decoder.remaining() / UNIT_LENGTH_BYTES);
    let mut heads = Vec::with_capacity(capacity);

    for (i, ty) in slots.clone().enumerate() {
        let head = if ty.is_dynamic() {
            decoder.read_length(unit).map(Head::Offset)
        } else {
            ty.decode_with(decoder, unit).map(Head::Decoded)
        };
        heads.push(head.map_err(|e| e.at(i))?);
    }

    slots
        .zip(heads)
        .enumerate()
        .map(|(i, (ty, head))| match head {
            Head::Decoded(value) => Ok(value),
            Head::Offset(0) if zero_offset_absent => {
                debug!("offset 0 @ index {}: no {} element present", i, ty);
                Ok(ty.zero_value())
            }
            Head::Offset(offset) => {
                decoder.enter_tail(head_start, offset);
                ty.decode_with(decoder, unit).map_err(|e| e.at(i))
            }
        })
        .collect()
}

fn read_elements<'a, T, F>(decoder: &mut Decoder<'a>, len: usize, mut read: F) -> Result<Vec<T>>
where
    F: FnMut(&mut Decoder<'a>) -> Result<T>,
{
    decoder.require(len.saturating_mul(UNIT_LENGTH_BYTES))?;

    let mut elements = Vec::with_capacity(len);
    for i in 0..len {
        elements.push(read(decoder).map_err(|e| e.at(i))?);
    }

    Ok(elements)
}

/// A boolean word is 31 zero bytes followed by 0 or 1.
fn read_bool(decoder: &mut Decoder<'_>, unit: &mut [u8; UNIT_LENGTH_BYTES]) -> Result<bool> {
    let start = decoder.position();
    decoder.read_unit(unit)?;

    let last = UNIT_LENGTH_BYTES - 1;
    if let Some(i) = unit[..last].iter().position(|b| *b != 0) {
        return Err(Error::MalformedBoolean { position: start + i });
    }

    match unit[last] {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(Error::MalformedBoolean {
            position: start + last,
        }),
    }
}

fn read_big_int(
    decoder: &mut Decoder<'_>,
    unit: &mut [u8; UNIT_LENGTH_BYTES],
    ty: &UnitType,
    element: bool,
) -> Result<BigInt> {
    decoder.read_unit(unit)?;

    let bi = ty.word_to_big_int(unit);
    if element {
        ty.validate_element(&bi)?;
    } else {
        ty.validate_scalar(&bi)?;
    }

    Ok(bi)
}

fn narrow<T>(bi: &BigInt, ty: &UnitType, convert: fn(&BigInt) -> Option<T>) -> Result<T> {
    convert(bi).ok_or(Error::BitLengthExceeded {
        bit_length: bi.bit_len(),
        limit: ty.bit_length(),
    })
}
