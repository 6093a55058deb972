//! Argument parsing at the tool boundary.
//!
//! Tool arguments arrive as JSON, and LLMs are inconsistent about sending
//! numbers as numbers. Both `5` and `"5"` are accepted; anything that is not
//! a plain integer is rejected instead of being coerced.

use std::str::FromStr;

use serde_json::Value;

use crate::error::StoreError;

/// Maximum number of items returned by a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Limit(u32);

impl Limit {
    pub const DEFAULT: Limit = Limit(10);

    pub fn new(limit: u32) -> Self {
        Self(limit)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Parse a JSON integer or numeric string.
    pub fn parse(value: &Value) -> Result<Self, StoreError> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Limit)
                .ok_or_else(|| {
                    StoreError::InvalidLimit(format!("expected a non-negative integer, got {}", n))
                }),
            Value::String(s) => s.parse(),
            other => Err(StoreError::InvalidLimit(format!(
                "expected an integer or numeric string, got {}",
                other
            ))),
        }
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for Limit {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Limit).map_err(|_| {
            StoreError::InvalidLimit(format!("expected a non-negative integer, got {:?}", s))
        })
    }
}

/// Parse an item id from a JSON integer or numeric string.
pub fn parse_item_id(value: &Value) -> Result<i64, StoreError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| StoreError::InvalidId(format!("expected an integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| StoreError::InvalidId(format!("expected an integer, got {:?}", s))),
        other => Err(StoreError::InvalidId(format!(
            "expected an integer or numeric string, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn limit_accepts_integer_and_numeric_text() {
        assert_eq!(Limit::parse(&json!(5)).unwrap(), Limit::new(5));
        assert_eq!(Limit::parse(&json!("5")).unwrap(), Limit::new(5));
        assert_eq!(Limit::parse(&json!(" 20 ")).unwrap(), Limit::new(20));
        assert_eq!(Limit::parse(&json!(0)).unwrap(), Limit::new(0));
    }

    #[test]
    fn limit_rejects_non_numeric_input() {
        assert!(matches!(
            Limit::parse(&json!("abc")),
            Err(StoreError::InvalidLimit(_))
        ));
        assert!(Limit::parse(&json!("")).is_err());
        assert!(Limit::parse(&json!(true)).is_err());
        assert!(Limit::parse(&json!([1])).is_err());
    }

    #[test]
    fn limit_rejects_negative_and_fractional() {
        assert!(Limit::parse(&json!(-1)).is_err());
        assert!(Limit::parse(&json!("-1")).is_err());
        assert!(Limit::parse(&json!(2.5)).is_err());
        assert!(Limit::parse(&json!("2.5")).is_err());
    }

    #[test]
    fn limit_defaults_to_ten() {
        assert_eq!(Limit::default().get(), 10);
    }

    #[test]
    fn item_id_accepts_integer_and_numeric_text() {
        assert_eq!(parse_item_id(&json!(7)).unwrap(), 7);
        assert_eq!(parse_item_id(&json!("7")).unwrap(), 7);
    }

    #[test]
    fn item_id_rejects_garbage() {
        assert!(matches!(
            parse_item_id(&json!("seven")),
            Err(StoreError::InvalidId(_))
        ));
        assert!(parse_item_id(&json!(1.5)).is_err());
        assert!(parse_item_id(&json!(null)).is_err());
    }
}
