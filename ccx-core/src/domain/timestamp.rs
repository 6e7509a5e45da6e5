//! Lenient timestamp parsing for backend date-times
//!
//! The backend serialises zone-less `LocalDateTime` values. Depending on its
//! Jackson settings they arrive as ISO strings (with or without fractional
//! seconds) or as `[year, month, day, hour, minute, second, nanos]` arrays.
//! Offset-carrying RFC 3339 strings are normalised to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Parse a timestamp string in any of the accepted shapes
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn from_parts(parts: &[JsonValue]) -> Option<NaiveDateTime> {
    let num = |i: usize| parts.get(i).and_then(JsonValue::as_i64).unwrap_or(0);
    if parts.len() < 3 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(num(0) as i32, num(1) as u32, num(2) as u32)?;
    date.and_hms_nano_opt(num(3) as u32, num(4) as u32, num(5) as u32, num(6) as u32)
}

/// Deserialize an optional timestamp, mapping unparseable values to `None`
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => parse(&s),
        Some(JsonValue::Array(parts)) => from_parts(&parts),
        _ => None,
    })
}
