//! Rows and row identity.
//!
//! A row is an opaque keyed record: the engine never interprets its
//! content except through column descriptors, and always via the typed
//! accessors here, which fail closed (absent or mistyped values read as
//! `None` and never match a filter).
//!
//! Key invariant: anything that must survive reordering stores a
//! `RowId`, never a positional index. Positions shift under every
//! filter/sort/group/page change; identities do not.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable, unique row identity. Opaque to the engine; uniqueness across
/// the dataset is a precondition, not something the engine reconciles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub String);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId(s)
    }
}

impl From<i64> for RowId {
    fn from(n: i64) -> Self {
        RowId(n.to_string())
    }
}

/// One record. `data` is the raw field map as it arrived from the
/// injected fetch function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub data: Map<String, Value>,
}

impl Row {
    pub fn new(id: impl Into<RowId>, data: Map<String, Value>) -> Self {
        Self { id: id.into(), data }
    }

    /// Build a row from a JSON object, taking identity from `id_key`.
    /// Returns `None` when the value is not an object or the identity
    /// field is missing/null.
    pub fn from_object(id_key: &str, value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        let id = stringify(map.get(id_key)?)?;
        Some(Self { id: RowId(id), data: map })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Stringified field value. Null and absent fields read as `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        stringify(self.data.get(key)?)
    }

    /// Numeric field value; numeric strings parse.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.data.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Field value as a timestamp. Accepts RFC 3339 and the common
    /// date-only / date-time layouts; anything else reads as `None`.
    pub fn date(&self, key: &str) -> Option<NaiveDateTime> {
        match self.data.get(key)? {
            Value::String(s) => parse_date(s),
            // Numeric values are taken as unix epoch seconds
            Value::Number(n) => chrono::DateTime::from_timestamp(n.as_i64()?, 0)
                .map(|dt| dt.naive_utc()),
            _ => None,
        }
    }
}

/// Scalar-to-string conversion used for text filtering, global search,
/// and export. Non-scalar values (objects, arrays) and null read as
/// `None` so they fail closed in predicates.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}

/// Parse a date string. Tried in order: RFC 3339, `Y-m-d H:M:S`,
/// `Y-m-d`, `m/d/Y`.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = chrono::NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
