//! Credit amount type for the bank's transaction feed.
//!
//! The feed reports `creditAmount` inconsistently: a JSON number, a numeric
//! string, the literal `"N/A"`, or nothing at all. `Amount` absorbs all of
//! those forms. An unknown amount counts as zero when summing.

use format_num::NumberFormat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

/// A credit amount in whole Vietnamese dong, or "not available".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Amount(Option<i64>);

impl Amount {
    pub const fn new(value: i64) -> Self {
        Self(Some(value))
    }

    pub const fn unknown() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<i64> {
        self.0
    }

    /// The value used when aggregating daily totals.
    pub fn or_zero(&self) -> i64 {
        self.0.unwrap_or(0)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl Display for Amount {
    /// Currency formatting with thousands separators, e.g. `1,234,567 VND`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => {
                let formatted = NumberFormat::new().format(",.0f", value as f64);
                write!(f, "{formatted} VND")
            }
            None => write!(f, "N/A"),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(value) => serializer.serialize_i64(value),
            None => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Float(f64),
            Text(String),
        }

        let value = match Option::<Raw>::deserialize(deserializer)? {
            None => None,
            Some(Raw::Number(n)) => Some(n),
            Some(Raw::Float(x)) => Some(x as i64),
            Some(Raw::Text(s)) => s.trim().replace(',', "").parse::<i64>().ok(),
        };
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_number() {
        let amount: Amount = serde_json::from_str("150000").unwrap();
        assert_eq!(amount.value(), Some(150_000));
    }

    #[test]
    fn test_deserialize_numeric_string() {
        let amount: Amount = serde_json::from_str("\"2000\"").unwrap();
        assert_eq!(amount.value(), Some(2_000));

        let with_commas: Amount = serde_json::from_str("\"1,500,000\"").unwrap();
        assert_eq!(with_commas.value(), Some(1_500_000));
    }

    #[test]
    fn test_deserialize_not_available() {
        let na: Amount = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(na.value(), None);

        let null: Amount = serde_json::from_str("null").unwrap();
        assert_eq!(null.value(), None);
    }

    #[test]
    fn test_unknown_counts_as_zero() {
        let amounts = [Amount::new(1_000), Amount::new(2_000), Amount::unknown()];
        let total: i64 = amounts.iter().map(Amount::or_zero).sum();
        assert_eq!(total, 3_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new(1_234_567).to_string(), "1,234,567 VND");
        assert_eq!(Amount::new(500).to_string(), "500 VND");
        assert_eq!(Amount::unknown().to_string(), "N/A");
    }

    #[test]
    fn test_serialize_round_trip() {
        let json = serde_json::to_string(&Amount::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Amount::new(42));

        let na = serde_json::to_string(&Amount::unknown()).unwrap();
        assert_eq!(na, "\"N/A\"");
        let back: Amount = serde_json::from_str(&na).unwrap();
        assert_eq!(back, Amount::unknown());
    }
}
