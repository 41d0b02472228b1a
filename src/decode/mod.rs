//! Opportunistic decoding of string cells on read.
//!
//! Text values that parse as JSON, or that carry PHP-serialized payloads,
//! are replaced with [`DbValue::Json`] when a row is converted to a
//! [`Record`]. Anything else passes through untouched. JSON wins when a
//! value qualifies as both.
//!
//! The JSON check is deliberately permissive: a text cell holding `123` or
//! `true` decodes to a JSON scalar. Use the raw query path when that is not
//! wanted.

use serde_json::Value as JsonValue;

use crate::results::{DbRow, Record};
use crate::types::DbValue;

mod php;

pub use php::{is_serialized, unserialize};

/// Check whether a string parses as JSON.
#[must_use]
pub fn is_json(s: &str) -> bool {
    serde_json::from_str::<JsonValue>(s).is_ok()
}

/// Try to decode a string cell; `None` means "leave it alone".
#[must_use]
pub fn decode_text(s: &str) -> Option<JsonValue> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    if php::is_serialized(trimmed, false) {
        match php::unserialize(trimmed) {
            Ok(value) => return Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "serialized-looking value failed to decode");
            }
        }
    }
    None
}

/// Decode a single value, replacing decodable text with JSON.
#[must_use]
pub fn decode_value(value: &DbValue) -> DbValue {
    match value {
        DbValue::Text(s) => decode_text(s)
            .map(DbValue::Json)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// Convert a row to a [`Record`], decoding every text cell.
#[must_use]
pub fn decode_row(row: &DbRow) -> Record {
    row.column_names
        .iter()
        .cloned()
        .zip(row.values.iter().map(decode_value))
        .collect()
}
