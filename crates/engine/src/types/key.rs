//! Primary keys of source records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The primary key of a record in the primary store.
///
/// Directus collections use either auto-increment integers or string keys
/// (usually UUIDs). Event payloads sometimes carry integer keys as strings,
/// so [`RecordKey::matches`] compares loosely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

impl RecordKey {
    /// Extracts a key from a JSON scalar. Returns `None` for anything else.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordKey::Int),
            Value::String(s) => Some(RecordKey::Str(s.clone())),
            _ => None,
        }
    }

    /// Converts the key back into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            RecordKey::Int(i) => Value::from(*i),
            RecordKey::Str(s) => Value::String(s.clone()),
        }
    }

    /// Returns true if a record's key field holds this key.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (RecordKey::Int(i), Value::Number(n)) => n.as_i64() == Some(*i),
            (RecordKey::Int(i), Value::String(s)) => s.parse::<i64>().ok() == Some(*i),
            (RecordKey::Str(s), Value::String(v)) => s == v,
            (RecordKey::Str(s), Value::Number(n)) => n.to_string() == *s,
            _ => false,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(i) => write!(f, "{}", i),
            RecordKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        RecordKey::Int(value)
    }
}

impl From<i32> for RecordKey {
    fn from(value: i32) -> Self {
        RecordKey::Int(i64::from(value))
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        RecordKey::Str(value.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        RecordKey::Str(value)
    }
}
