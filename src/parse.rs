use std::str::FromStr;

use num_bigint::BigInt;

use crate::{
    error::{Error, Result},
    types::{TypeDescriptor, TypeKind},
    values::{Decimal, Value},
};

impl TypeDescriptor {
    /// Parses a single textual literal into a validated value of this type.
    ///
    /// Only atomic types have a literal form; arrays and tuples fail with
    /// [`Error::UnsupportedOperation`].
    pub fn parse_argument(&self, s: &str) -> Result<Value> {
        let value = match self.kind() {
            TypeKind::Bool => match s.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(self.invalid_literal(s)),
            },
            TypeKind::Byte => Value::Byte(self.parse_integer(s)?),
            TypeKind::Int(_) => Value::Int(self.parse_integer(s)?),
            TypeKind::Long(_) => Value::Long(self.parse_integer(s)?),
            TypeKind::BigInt(_) => Value::BigInt(self.parse_integer(s)?),
            TypeKind::Decimal { .. } => {
                let (_, (negative, int_part, frac_part)) =
                    parsers::parse_exact_decimal(s).map_err(|_| self.invalid_literal(s))?;

                let digits = format!(
                    "{}{}{}",
                    if negative { "-" } else { "" },
                    int_part,
                    frac_part
                );
                let unscaled = BigInt::from_str(&digits).map_err(|_| self.invalid_literal(s))?;

                Value::Decimal(Decimal::new(unscaled, frac_part.len() as u32))
            }
            TypeKind::Array(_) | TypeKind::Tuple(_) => {
                return Err(Error::UnsupportedOperation {
                    operation: "parse_argument",
                    canonical_type: self.canonical_type().to_string(),
                })
            }
        };

        self.validate(&value)?;

        Ok(value)
    }

    fn parse_integer<T: FromStr>(&self, s: &str) -> Result<T> {
        let (_, literal) = parsers::parse_exact_integer(s).map_err(|_| self.invalid_literal(s))?;

        literal
            .trim_start_matches('+')
            .parse()
            .map_err(|_| self.invalid_literal(s))
    }

    fn invalid_literal(&self, s: &str) -> Error {
        Error::InvalidLiteral {
            canonical_type: self.canonical_type().to_string(),
            literal: s.to_string(),
        }
    }
}

mod parsers {
    use nom::{
        character::complete::{char, digit1, one_of},
        combinator::{all_consuming, map, opt, recognize},
        sequence::{pair, preceded, tuple},
        IResult,
    };

    /// Optionally signed decimal integer, e.g. `-42`.
    pub fn parse_exact_integer(input: &str) -> IResult<&str, &str> {
        all_consuming(recognize(pair(opt(one_of("+-")), digit1)))(input)
    }

    /// Optionally signed decimal with an optional fraction, e.g. `-3.14`.
    /// Yields the sign, the integer digits and the fraction digits.
    pub fn parse_exact_decimal(input: &str) -> IResult<&str, (bool, &str, &str)> {
        all_consuming(map(
            tuple((
                opt(one_of("+-")),
                digit1,
                opt(preceded(char('.'), digit1)),
            )),
            |(sign, int_part, frac_part)| (sign == Some('-'), int_part, frac_part.unwrap_or("")),
        ))(input)
    }

}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_bool() {
        let ty = TypeDescriptor::boolean();

        assert_eq!(ty.parse_argument("true"), Ok(Value::Bool(true)));
        assert_eq!(ty.parse_argument("FALSE"), Ok(Value::Bool(false)));
        assert!(matches!(
            ty.parse_argument("yes"),
            Err(Error::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn parse_integers() {
        assert_eq!(
            TypeDescriptor::int(16).unwrap().parse_argument("-300"),
            Ok(Value::Int(-300))
        );
        assert_eq!(
            TypeDescriptor::uint(32).unwrap().parse_argument("4294967295"),
            Ok(Value::Long(4_294_967_295))
        );
        assert_eq!(
            TypeDescriptor::uint(256).unwrap().parse_argument("+115792089237316195423570985008687907853269984665640564039457584007913129639935"),
            Ok(Value::BigInt((BigInt::from(1) << 256u32) - 1))
        );
    }

    #[test]
    fn parsed_value_is_validated() {
        let uint8 = TypeDescriptor::uint(8).unwrap();

        assert_eq!(uint8.parse_argument("-1"), Err(Error::NegativeForUnsigned));
        assert!(matches!(
            uint8.parse_argument("256"),
            Err(Error::BitLengthExceeded { .. })
        ));
        // does not fit the native i32
        assert!(matches!(
            uint8.parse_argument("99999999999"),
            Err(Error::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn parse_decimal() {
        let ty = TypeDescriptor::fixed(128, 2).unwrap();

        assert_eq!(
            ty.parse_argument("-12.50"),
            Ok(Value::Decimal(Decimal::new(-1250, 2)))
        );
        assert_eq!(
            ty.parse_argument("12.5"),
            Err(Error::ScaleMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            ty.parse_argument("abc"),
            Err(Error::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn composites_have_no_literal() {
        let arr = TypeDescriptor::dynamic_array(TypeDescriptor::boolean());
        let tuple = TypeDescriptor::tuple(vec![TypeDescriptor::boolean()]);

        for ty in [arr, tuple, TypeDescriptor::string()] {
            assert!(matches!(
                ty.parse_argument("true"),
                Err(Error::UnsupportedOperation {
                    operation: "parse_argument",
                    ..
                })
            ));
        }
    }
}
