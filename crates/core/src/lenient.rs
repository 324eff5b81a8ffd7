//! Tolerant readers for loosely-typed API fields.
//!
//! The REST API is not consistent about numbers: counts arrive as integers,
//! floats, numeric strings or `null`. These helpers never fail; anything
//! unreadable becomes `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::session::Participants;
use crate::types::DbId;

/// Read a non-negative count out of a JSON value.
///
/// Floats are truncated. Negative numbers and non-numeric values yield `None`.
pub fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Some(v)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<u64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            })
        }
        _ => None,
    }
}

/// Read an identifier out of a JSON value (integer or numeric string).
pub fn as_id(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `deserialize_with` adapter for optional counts. Use with `#[serde(default)]`.
pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(as_count))
}

/// `deserialize_with` adapter for optional identifiers. Use with `#[serde(default)]`.
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<DbId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(as_id))
}

/// `deserialize_with` adapter for required identifiers; unreadable values
/// become `0`. Use with `#[serde(default)]`.
pub fn id_or_zero<'de, D>(deserializer: D) -> Result<DbId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(as_id).unwrap_or(0))
}

/// `deserialize_with` adapter for string-backed enums. Numbers are read as
/// their decimal text; other shapes become `None`. Use with `#[serde(default)]`.
pub fn opt_tag<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(T::from(s)),
        Some(Value::Number(n)) => Some(T::from(n.to_string())),
        _ => None,
    })
}

/// `deserialize_with` adapter for a participant list or head count. Use with
/// `#[serde(default)]`.
pub fn opt_participants<'de, D>(deserializer: D) -> Result<Option<Participants>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(entries)) => Some(Participants::List(entries)),
        Some(other) => as_count(&other).map(Participants::Count),
        None => None,
    })
}

/// `deserialize_with` adapter for optional strings that may arrive as
/// numbers or other scalars. Empty strings become `None`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
