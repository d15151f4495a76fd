//! Helpers for decoding Kraken's positional JSON arrays.
//!
//! The v1 feed encodes most payload fields by array index and sends decimals
//! as strings (`"5541.30000"`). These helpers check arity and pull typed
//! values out by position, reporting failures as
//! [`FeedError::SchemaMismatch`].

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::{FeedError, Result};

/// Borrows `value` as an array of exactly `N` elements.
pub fn fixed_array<'a, const N: usize>(value: &'a Value, what: &str) -> Result<&'a [Value; N]> {
    let items = array(value, what)?;
    <&[Value; N]>::try_from(items).map_err(|_| {
        FeedError::SchemaMismatch(format!("{what}: expected {N} fields, got {}", items.len()))
    })
}

/// Borrows `value` as an array of any length.
pub fn array<'a>(value: &'a Value, what: &str) -> Result<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| FeedError::SchemaMismatch(format!("{what}: expected an array")))
}

/// Parses a decimal encoded either as a JSON string or a JSON number.
pub fn decimal(value: &Value, what: &str) -> Result<Decimal> {
    let parsed = match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    };
    parsed.ok_or_else(|| FeedError::SchemaMismatch(format!("{what}: not a decimal: {value}")))
}

/// Parses an integer encoded either as a JSON number or a numeric string.
pub fn integer(value: &Value, what: &str) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| FeedError::SchemaMismatch(format!("{what}: not an integer: {value}")))
}

/// Borrows a JSON string.
pub fn string<'a>(value: &'a Value, what: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| FeedError::SchemaMismatch(format!("{what}: not a string: {value}")))
}

/// Looks up a required key on a JSON object.
pub fn field<'a>(value: &'a Value, key: &str, what: &str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| FeedError::SchemaMismatch(format!("{what}: missing field {key:?}")))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn decimal_accepts_strings_and_numbers() {
        assert_eq!(decimal(&json!("5541.30000"), "price").unwrap(), dec!(5541.30000));
        assert_eq!(decimal(&json!(0.25), "price").unwrap(), dec!(0.25));
        assert_eq!(decimal(&json!(7), "price").unwrap(), dec!(7));
    }

    #[test]
    fn decimal_keeps_wire_scale() {
        let value = decimal(&json!("0.12300000"), "volume").unwrap();
        assert_eq!(value.scale(), 8);
    }

    #[test]
    fn decimal_rejects_garbage() {
        let err = decimal(&json!("abc"), "price").unwrap_err();
        assert!(matches!(err, FeedError::SchemaMismatch(_)));
        assert!(decimal(&json!(null), "price").is_err());
    }

    #[test]
    fn integer_accepts_numeric_strings() {
        assert_eq!(integer(&json!(5), "count").unwrap(), 5);
        assert_eq!(integer(&json!("974942666"), "checksum").unwrap(), 974942666);
        assert!(integer(&json!("1.5"), "count").is_err());
    }

    #[test]
    fn fixed_array_checks_arity() {
        let value = json!(["1", "2"]);
        let [first, second] = fixed_array::<2>(&value, "pair").unwrap();
        assert_eq!(first, "1");
        assert_eq!(second, "2");

        let err = fixed_array::<3>(&value, "triple").unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema mismatch: triple: expected 3 fields, got 2"
        );
        assert!(fixed_array::<1>(&json!({"a": 1}), "obj").is_err());
    }
}
