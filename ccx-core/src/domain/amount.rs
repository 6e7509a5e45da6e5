//! Monetary amount (de)serialization helpers
//!
//! The backend emits `BigDecimal` values as JSON numbers; some proxies turn
//! them into strings. Both are accepted. Outgoing amounts are written as
//! JSON numbers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value as JsonValue;

fn from_value<E: serde::de::Error>(value: JsonValue) -> Result<Option<Decimal>, E> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => {
            let s = n.to_string();
            s.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&s))
                .map(Some)
                .map_err(|e| E::custom(format!("invalid decimal: {}", e)))
        }
        JsonValue::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|e| E::custom(format!("invalid decimal: {}", e))),
        _ => Err(E::custom("expected number or string for amount")),
    }
}

/// Deserialize an amount that may be missing or null (treated as zero)
pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    Ok(from_value(value.unwrap_or(JsonValue::Null))?.unwrap_or_default())
}

/// Deserialize an optional amount
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    from_value(value.unwrap_or(JsonValue::Null))
}

/// Serialize an amount as a JSON number
pub fn serialize_number<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match amount.to_f64() {
        Some(f) => serializer.serialize_f64(f),
        None => Err(serde::ser::Error::custom("amount out of range")),
    }
}
