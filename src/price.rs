//! Decimal USD prices
//!
//! Prices are held as integer micro-dollars so threshold comparisons and CSV
//! output are exact and repeatable. Floating point is never involved.

use crate::error::{ExportError, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MICROS_PER_DOLLAR: u64 = 1_000_000;
const MAX_FRACTION_DIGITS: usize = 6;

/// A non-negative USD amount with up to six decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UsdPrice(u64);

impl UsdPrice {
    pub const ZERO: UsdPrice = UsdPrice(0);

    pub fn from_micros(micros: u64) -> Self {
        UsdPrice(micros)
    }

    pub fn micros(&self) -> u64 {
        self.0
    }

    /// Parse a decimal string like `"1.25"`, `"0.8"` or `"3"`.
    ///
    /// Rejects signs, exponents, empty input and more than six fractional
    /// digits (those would need rounding).
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim();
        let invalid = || ExportError::InvalidPrice {
            raw: raw.to_string(),
        };

        let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }
        if frac_part.len() > MAX_FRACTION_DIGITS {
            return Err(invalid());
        }

        let dollars: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let frac: u64 = format!("{:0<width$}", frac_part, width = MAX_FRACTION_DIGITS)
            .parse()
            .map_err(|_| invalid())?;

        dollars
            .checked_mul(MICROS_PER_DOLLAR)
            .and_then(|v| v.checked_add(frac))
            .map(UsdPrice)
            .ok_or_else(invalid)
    }
}

impl FromStr for UsdPrice {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        UsdPrice::parse(s)
    }
}

/// Formats with at least two decimals: `1.25`, `0.80`, `0.125`.
impl fmt::Display for UsdPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / MICROS_PER_DOLLAR;
        let frac = format!("{:06}", self.0 % MICROS_PER_DOLLAR);
        let trimmed = frac.trim_end_matches('0');
        let digits = if trimmed.len() < 2 { &frac[..2] } else { trimmed };
        write!(f, "{}.{}", dollars, digits)
    }
}

impl Serialize for UsdPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UsdPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PriceVisitor;

        impl<'de> Visitor<'de> for PriceVisitor {
            type Value = UsdPrice;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal price string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<UsdPrice, E> {
                UsdPrice::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<UsdPrice, E> {
                v.checked_mul(MICROS_PER_DOLLAR)
                    .map(UsdPrice)
                    .ok_or_else(|| E::custom(format!("price out of range: {}", v)))
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_price_shapes() {
        assert_eq!(UsdPrice::parse("1.25").unwrap().micros(), 1_250_000);
        assert_eq!(UsdPrice::parse("0.8").unwrap().micros(), 800_000);
        assert_eq!(UsdPrice::parse("3").unwrap().micros(), 3_000_000);
        assert_eq!(UsdPrice::parse(".5").unwrap().micros(), 500_000);
        assert_eq!(UsdPrice::parse(" 12.000001 ").unwrap().micros(), 12_000_001);
    }

    #[test]
    fn rejects_unrepresentable_input() {
        for raw in ["", ".", "-1", "1e3", "abc", "1.2.3", "0.1234567"] {
            assert!(
                matches!(UsdPrice::parse(raw), Err(ExportError::InvalidPrice { .. })),
                "expected rejection for {raw:?}"
            );
        }
    }

    #[test]
    fn displays_at_least_two_decimals() {
        assert_eq!(UsdPrice::parse("1.25").unwrap().to_string(), "1.25");
        assert_eq!(UsdPrice::parse("0.8").unwrap().to_string(), "0.80");
        assert_eq!(UsdPrice::parse("7").unwrap().to_string(), "7.00");
        assert_eq!(UsdPrice::parse("0.125").unwrap().to_string(), "0.125");
        assert_eq!(UsdPrice::ZERO.to_string(), "0.00");
    }

    #[test]
    fn ordering_follows_amount() {
        let threshold = UsdPrice::parse("0.80").unwrap();
        assert!(UsdPrice::parse("1.25").unwrap() > threshold);
        assert!(UsdPrice::parse("0.8").unwrap() <= threshold);
    }

    #[test]
    fn deserializes_scryfall_price_strings() {
        let price: Option<UsdPrice> = serde_json::from_str(r#""0.25""#).unwrap();
        assert_eq!(price, Some(UsdPrice::from_micros(250_000)));

        let missing: Option<UsdPrice> = serde_json::from_str("null").unwrap();
        assert_eq!(missing, None);
    }
}
