use ethereum_types::U256;
use num_bigint::{BigInt, Sign};

use crate::error::{Error, Result};

/// Every atomic value occupies one 32-byte word in the padded encoding.
pub const UNIT_LENGTH_BYTES: usize = 32;
pub(crate) const LOG_2_UNIT_LENGTH_BYTES: u32 = 5;

/// Count and offset words are unsigned 32-bit quantities.
pub(crate) const LENGTH_WORD_TYPE: UnitType = UnitType::new(32, true);

/// Range of the raw bytes inside `bytes`, `bytesN` and `string`.
pub(crate) const BYTE_UNIT: UnitType = UnitType::new(8, false);

/// Rounds a length up to the nearest multiple of 32. If `len` already is a
/// multiple, it is returned unchanged.
pub fn round_up_32(len: usize) -> usize {
    let r = len & 31;

    if r == 0 {
        len
    } else {
        len + (32 - r)
    }
}

/// Numeric range of a word-based atomic type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UnitType {
    bit_length: u16,
    unsigned: bool,
}

impl UnitType {
    pub(crate) const fn new(bit_length: u16, unsigned: bool) -> Self {
        UnitType {
            bit_length,
            unsigned,
        }
    }

    pub fn bit_length(&self) -> u16 {
        self.bit_length
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    /// Bytes this type occupies in the packed encoding.
    pub fn packed_length(&self) -> usize {
        (self.bit_length >> 3) as usize
    }

    /// Full check for a standalone value: bit length and, for unsigned
    /// types, sign.
    pub fn validate_scalar<M: Magnitude + ?Sized>(&self, value: &M) -> Result<()> {
        self.check_bit_len(value.bit_len())?;
        if self.unsigned && value.is_negative() {
            return Err(Error::NegativeForUnsigned);
        }
        Ok(())
    }

    /// Check for a value inside an array. Only the bit length is checked:
    /// negative elements of an unsigned array type are accepted.
    pub fn validate_element<M: Magnitude + ?Sized>(&self, value: &M) -> Result<()> {
        self.check_bit_len(value.bit_len())
    }

    fn check_bit_len(&self, bit_len: u64) -> Result<()> {
        // signed types spend one bit on the sign
        let needed = if self.unsigned { bit_len } else { bit_len + 1 };
        if needed > self.bit_length as u64 {
            return Err(Error::BitLengthExceeded {
                bit_length: needed,
                limit: self.bit_length,
            });
        }
        Ok(())
    }

    /// Reads a wire word as an integer. Only `uint256` treats the top bit as
    /// magnitude; every other width reads the word as two's complement.
    pub(crate) fn word_to_big_int(&self, word: &[u8; UNIT_LENGTH_BYTES]) -> BigInt {
        if self.unsigned && self.bit_length as usize == UNIT_LENGTH_BYTES * 8 {
            BigInt::from_bytes_be(Sign::Plus, word)
        } else {
            BigInt::from_signed_bytes_be(word)
        }
    }
}

/// Minimal bit length and sign of an integer value, in the sense of a two's
/// complement representation without the sign bit.
pub trait Magnitude {
    fn bit_len(&self) -> u64;

    fn is_negative(&self) -> bool;
}

impl Magnitude for i64 {
    fn bit_len(&self) -> u64 {
        let v = *self;
        let bits = if v >= 0 {
            64 - v.leading_zeros()
        } else {
            64 - (!v).leading_zeros()
        };
        bits as u64
    }

    fn is_negative(&self) -> bool {
        *self < 0
    }
}

impl Magnitude for i32 {
    fn bit_len(&self) -> u64 {
        (*self as i64).bit_len()
    }

    fn is_negative(&self) -> bool {
        *self < 0
    }
}

impl Magnitude for BigInt {
    fn bit_len(&self) -> u64 {
        let bits = self.bits();
        if self.sign() != Sign::Minus {
            return bits;
        }
        // -2^k needs one bit fewer than its magnitude
        let magnitude = self.magnitude();
        if magnitude.trailing_zeros() == Some(bits - 1) {
            bits - 1
        } else {
            bits
        }
    }

    fn is_negative(&self) -> bool {
        self.sign() == Sign::Minus
    }
}

/// Sign-extended 32-byte big-endian word.
pub(crate) fn long_word(v: i64) -> [u8; UNIT_LENGTH_BYTES] {
    let fill = if v < 0 { 0xff } else { 0x00 };
    let mut word = [fill; UNIT_LENGTH_BYTES];
    word[UNIT_LENGTH_BYTES - 8..].copy_from_slice(&v.to_be_bytes());
    word
}

pub(crate) fn big_int_word(v: &BigInt) -> Result<[u8; UNIT_LENGTH_BYTES]> {
    let (fill, bytes) = if v.sign() == Sign::Minus {
        (0xff, v.to_signed_bytes_be())
    } else {
        (0x00, v.magnitude().to_bytes_be())
    };

    if bytes.len() > UNIT_LENGTH_BYTES {
        return Err(Error::BitLengthExceeded {
            bit_length: v.bit_len(),
            limit: (UNIT_LENGTH_BYTES * 8) as u16,
        });
    }

    let mut word = [fill; UNIT_LENGTH_BYTES];
    word[UNIT_LENGTH_BYTES - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

pub(crate) fn bool_word(b: bool) -> [u8; UNIT_LENGTH_BYTES] {
    let mut word = [0u8; UNIT_LENGTH_BYTES];
    word[UNIT_LENGTH_BYTES - 1] = b as u8;
    word
}

/// Word holding an element count or a tail offset.
pub(crate) fn length_word(len: usize) -> [u8; UNIT_LENGTH_BYTES] {
    let mut word = [0u8; UNIT_LENGTH_BYTES];
    U256::from(len).to_big_endian(&mut word);
    word
}

/// Reads a count or offset word, rejecting negative and over-wide values.
pub(crate) fn word_to_length(word: &[u8; UNIT_LENGTH_BYTES]) -> Result<usize> {
    if word[0] & 0x80 != 0 {
        return Err(Error::NegativeForUnsigned);
    }

    let len = U256::from_big_endian(word);
    let limit = LENGTH_WORD_TYPE.bit_length();
    if len.bits() > limit as usize {
        return Err(Error::BitLengthExceeded {
            bit_length: len.bits() as u64,
            limit,
        });
    }

    Ok(len.low_u64() as usize)
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn round_up() {
        assert_eq!(round_up_32(0), 0);
        assert_eq!(round_up_32(1), 32);
        assert_eq!(round_up_32(31), 32);
        assert_eq!(round_up_32(32), 32);
        assert_eq!(round_up_32(33), 64);

        for len in 0..200 {
            let once = round_up_32(len);
            assert_eq!(round_up_32(once), once);
            assert_eq!(once == len, len % 32 == 0);
        }
    }

    #[test]
    fn long_bit_len() {
        assert_eq!(0i64.bit_len(), 0);
        assert_eq!(1i64.bit_len(), 1);
        assert_eq!(255i64.bit_len(), 8);
        assert_eq!((-1i64).bit_len(), 0);
        assert_eq!((-128i64).bit_len(), 7);
        assert_eq!((-129i64).bit_len(), 8);
        assert_eq!(i64::MIN.bit_len(), 63);
    }

    #[test]
    fn big_int_bit_len_matches_long() {
        for v in [0i64, 1, 7, 8, 255, 256, -1, -2, -128, -129, -256, i64::MAX, i64::MIN] {
            assert_eq!(BigInt::from(v).bit_len(), v.bit_len(), "value {}", v);
        }
    }

    #[test]
    fn signed_range() {
        let int8 = UnitType::new(8, false);

        assert_eq!(int8.validate_scalar(&127i64), Ok(()));
        assert_eq!(int8.validate_scalar(&-128i64), Ok(()));
        assert_eq!(
            int8.validate_scalar(&128i64),
            Err(Error::BitLengthExceeded {
                bit_length: 9,
                limit: 8
            })
        );
        assert!(int8.validate_scalar(&-129i64).is_err());
    }

    #[test]
    fn unsigned_range() {
        let uint8 = UnitType::new(8, true);

        assert_eq!(uint8.validate_scalar(&255i64), Ok(()));
        assert!(matches!(
            uint8.validate_scalar(&256i64),
            Err(Error::BitLengthExceeded { .. })
        ));
        assert_eq!(
            uint8.validate_scalar(&-1i64),
            Err(Error::NegativeForUnsigned)
        );
    }

    // Array elements skip the sign check. Whether unsigned array elements
    // should reject negatives is still open; this pins the current policy.
    #[test]
    fn element_skips_sign_check() {
        let uint8 = UnitType::new(8, true);

        assert_eq!(uint8.validate_element(&-1i64), Ok(()));
        assert_eq!(uint8.validate_element(&BigInt::from(-200)), Ok(()));
        assert!(uint8.validate_element(&256i64).is_err());
    }

    #[test]
    fn words() {
        assert_eq!(long_word(-1), [0xff; 32]);
        assert_eq!(long_word(1)[31], 1);
        assert_eq!(bool_word(true)[31], 1);

        let max = (BigInt::from(1) << 256u32) - 1;
        assert_eq!(big_int_word(&max), Ok([0xff; 32]));
        assert!(big_int_word(&(BigInt::from(1) << 256u32)).is_err());

        let uint256 = UnitType::new(256, true);
        let int256 = UnitType::new(256, false);
        assert_eq!(uint256.word_to_big_int(&[0xff; 32]), max);
        assert_eq!(int256.word_to_big_int(&[0xff; 32]), BigInt::from(-1));
    }

    #[test]
    fn length_words() {
        assert_eq!(word_to_length(&length_word(1_000_000)), Ok(1_000_000));
        assert_eq!(
            word_to_length(&[0xff; 32]),
            Err(Error::NegativeForUnsigned)
        );

        let mut wide = [0u8; 32];
        wide[27] = 1;
        assert_eq!(
            word_to_length(&wide),
            Err(Error::BitLengthExceeded {
                bit_length: 33,
                limit: 32
            })
        );
    }
}
