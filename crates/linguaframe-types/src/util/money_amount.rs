//! Human-entered decimal amounts.
//!
//! [`MoneyAmount`] is what the amount field of a payment form parses into. It keeps
//! the precision the user typed, so the chain layer can reject inputs finer than a
//! token's decimals before scaling them into integer units.
//!
//! Accepted input: plain decimals (`"1"`, `"0.01"`, `".5"`, `"1."`), surrounded by
//! optional whitespace. Currency symbols, separators and exponents are
//! [`MoneyAmountParseError::InvalidFormat`]; `"1,5"` is never read as `15`.
//!
//! ```rust
//! use linguaframe_types::util::MoneyAmount;
//!
//! let amount = MoneyAmount::parse("10.50").unwrap();
//! assert_eq!(amount.scale(), 2);
//! assert_eq!(amount.mantissa(), 1050);
//! ```

use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// A non-negative decimal amount with the precision it was written in.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyAmount(pub Decimal);

impl MoneyAmount {
    /// Number of digits after the decimal point in the original input.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// The digits without the decimal point: `"12.34"` gives `1234`.
    pub fn mantissa(&self) -> u128 {
        self.0.mantissa().unsigned_abs()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// Errors that can occur when parsing a monetary amount.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoneyAmountParseError {
    #[error("Invalid number format")]
    InvalidFormat,
    /// More significant digits than a 96-bit decimal holds.
    #[error("Amount is too large")]
    OutOfRange,
    #[error("Negative value is not allowed")]
    Negative,
    /// The input has more decimal places than the token supports.
    #[error("Too big of a precision: {money} vs {token} on token")]
    WrongPrecision { money: u32, token: u32 },
}

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(\d+(\.\d*)?|\.\d+)$").expect("valid regex"));

impl MoneyAmount {
    /// Parses a plain decimal string, ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let trimmed = input.trim();
        if !NUMBER.is_match(trimmed) {
            return Err(MoneyAmountParseError::InvalidFormat);
        }
        let (sign, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", trimmed),
        };
        let digits = digits.strip_suffix('.').unwrap_or(digits);
        let normalized = match digits.strip_prefix('.') {
            Some(fraction) => format!("{sign}0.{fraction}"),
            None => format!("{sign}{digits}"),
        };

        let parsed =
            Decimal::from_str(&normalized).map_err(|_| MoneyAmountParseError::OutOfRange)?;

        if parsed.is_sign_negative() && !parsed.is_zero() {
            return Err(MoneyAmountParseError::Negative);
        }

        Ok(MoneyAmount(parsed.abs()))
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl TryFrom<&str> for MoneyAmount {
    type Error = MoneyAmountParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MoneyAmount::from_str(value)
    }
}

impl TryFrom<&String> for MoneyAmount {
    type Error = MoneyAmountParseError;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        MoneyAmount::from_str(value)
    }
}

impl From<u64> for MoneyAmount {
    fn from(value: u64) -> Self {
        MoneyAmount(Decimal::from(value))
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_numbers() {
        let one = MoneyAmount::parse("1").unwrap();
        assert_eq!(one.scale(), 0);
        assert_eq!(one.mantissa(), 1);

        let cents = MoneyAmount::parse("0.01").unwrap();
        assert_eq!(cents.scale(), 2);
        assert_eq!(cents.mantissa(), 1);
    }

    #[test]
    fn test_parse_keeps_trailing_zeros_in_scale() {
        let amount = MoneyAmount::parse("1.50").unwrap();
        assert_eq!(amount.scale(), 2);
        assert_eq!(amount.mantissa(), 150);
        assert_eq!(amount.to_string(), "1.5");
    }

    #[test]
    fn test_parse_leading_and_trailing_dot() {
        assert_eq!(MoneyAmount::parse(".5").unwrap().to_string(), "0.5");
        let whole = MoneyAmount::parse("1.").unwrap();
        assert_eq!(whole.scale(), 0);
        assert_eq!(whole.mantissa(), 1);
    }

    #[test]
    fn test_parse_zero_is_allowed() {
        let zero = MoneyAmount::parse("0").unwrap();
        assert!(zero.is_zero());
        assert!(MoneyAmount::parse("-0").unwrap().is_zero());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["abc", "", " ", ".", "1e5", "1.2.3", "abc1", "0x10", "--1", "1,5", "1,000", "$1"] {
            assert_eq!(
                MoneyAmount::parse(input),
                Err(MoneyAmountParseError::InvalidFormat),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(
            MoneyAmount::parse("-1"),
            Err(MoneyAmountParseError::Negative)
        );
    }

    #[test]
    fn test_parse_large_amounts() {
        assert_eq!(
            MoneyAmount::parse("1000000000").unwrap().mantissa(),
            1_000_000_000
        );
        assert_eq!(
            MoneyAmount::parse("99999999999999999999999999999999"),
            Err(MoneyAmountParseError::OutOfRange)
        );
    }
}
