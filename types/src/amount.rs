//! Money in integer centavos.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing an [`Amount`] from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("too many decimal places: {0}")]
    Precision(String),
}

/// A BRL amount stored as centavos.
///
/// The backend sends plain JSON numbers (`10.5`) and sometimes numeric strings
/// (`"10.50"`); both round to the nearest centavo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_centavos(centavos: i64) -> Self {
        Self(centavos)
    }

    pub const fn from_reais(reais: i64) -> Self {
        Self(reais * 100)
    }

    pub const fn centavos(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Plain decimal with a dot and two places (`1234.56`), as form fields
    /// and payment payloads expect.
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let centavos = (value * 100.0).round();
        if centavos.abs() > i64::MAX as f64 {
            return None;
        }
        Some(Self(centavos as i64))
    }

    fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

/// Saturates at the `i64` bounds; use [`Amount::checked_add`] where an
/// overflow must be reported.
impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

/// Formats as `R$ 1.234,56`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let reais = (abs / 100).to_string();
        let cents = abs % 100;

        let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
        for (i, ch) in reais.chars().enumerate() {
            if i > 0 && (reais.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}R$ {grouped},{cents:02}")
    }
}

/// Parses user input such as `25`, `25.5`, `25,50` or `R$ 25,50`.
impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches("R$").trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        let normalized = trimmed.replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };
        if fraction.len() > 2 {
            return Err(AmountError::Precision(s.to_string()));
        }
        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
            return Err(AmountError::Invalid(s.to_string()));
        }
        let reais: i64 = whole
            .parse()
            .map_err(|_| AmountError::Invalid(s.to_string()))?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse::<i64>().unwrap_or(0),
        };
        reais
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Amount)
            .ok_or_else(|| AmountError::Invalid(s.to_string()))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl de::Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal BRL amount")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                Amount::from_decimal(v).ok_or_else(|| E::custom(format!("amount out of range: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                v.checked_mul(100)
                    .map(Amount)
                    .ok_or_else(|| E::custom(format!("amount out of range: {v}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .map(Amount)
                    .ok_or_else(|| E::custom(format!("amount out of range: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                let parsed: f64 = v
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("invalid amount: {v}")))?;
                self.visit_f64(parsed)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Amount::from_centavos(0).to_string(), "R$ 0,00");
        assert_eq!(Amount::from_centavos(1050).to_string(), "R$ 10,50");
        assert_eq!(Amount::from_centavos(123_456_789).to_string(), "R$ 1.234.567,89");
        assert_eq!(Amount::from_centavos(-500).to_string(), "-R$ 5,00");
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!("25".parse::<Amount>().unwrap(), Amount::from_reais(25));
        assert_eq!("25.5".parse::<Amount>().unwrap(), Amount::from_centavos(2550));
        assert_eq!("R$ 25,05".parse::<Amount>().unwrap(), Amount::from_centavos(2505));
        assert_eq!("".parse::<Amount>(), Err(AmountError::Empty));
        assert!(matches!("1.234".parse::<Amount>(), Err(AmountError::Precision(_))));
        assert!(matches!("-3".parse::<Amount>(), Err(AmountError::Invalid(_))));
        assert!(matches!("abc".parse::<Amount>(), Err(AmountError::Invalid(_))));
    }

    #[test]
    fn test_deserialize_wire_forms() {
        let from_float: Amount = serde_json::from_str("10.5").unwrap();
        let from_int: Amount = serde_json::from_str("7").unwrap();
        let from_str: Amount = serde_json::from_str("\"0.1\"").unwrap();
        assert_eq!(from_float, Amount::from_centavos(1050));
        assert_eq!(from_int, Amount::from_reais(7));
        assert_eq!(from_str, Amount::from_centavos(10));
    }

    #[test]
    fn test_decimal_string_is_exact() {
        assert_eq!(Amount::from_centavos(1999).to_decimal_string(), "19.99");
        assert_eq!(Amount::from_centavos(5).to_decimal_string(), "0.05");
        assert_eq!(Amount::from_centavos(-250).to_decimal_string(), "-2.50");
        // Beyond f64's 53-bit mantissa
        assert_eq!(
            Amount::from_centavos(9_007_199_254_740_993).to_decimal_string(),
            "90071992547409.93"
        );
    }

    #[test]
    fn test_arithmetic_near_bounds() {
        let max = Amount::from_centavos(i64::MAX);
        assert_eq!(max.checked_add(Amount::from_centavos(1)), None);
        assert_eq!(max + Amount::from_centavos(1), max);
        assert_eq!(
            Amount::from_centavos(i64::MIN) - Amount::from_centavos(1),
            Amount::from_centavos(i64::MIN)
        );
        assert_eq!(
            Amount::from_reais(2).checked_sub(Amount::from_reais(5)),
            Some(Amount::from_reais(-3))
        );
    }

    #[test]
    fn test_serialize_as_decimal() {
        let json = serde_json::to_string(&Amount::from_centavos(1999)).unwrap();
        assert_eq!(json, "19.99");
    }

    proptest! {
        #[test]
        fn centavos_survive_the_wire(centavos in -10_000_000_000i64..10_000_000_000i64) {
            let amount = Amount::from_centavos(centavos);
            let json = serde_json::to_string(&amount).unwrap();
            let back: Amount = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, amount);
        }
    }
}
