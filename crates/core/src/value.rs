//! Metadata value model
//!
//! Vector metadata is an arbitrary key -> value map. Values form a closed
//! algebraic type: null, bool, number, string, list or nested map. The
//! serde representation is untagged, so metadata reads and writes as plain
//! JSON.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Vector metadata (insertion order irrelevant)
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (stored as f64)
    Number(f64),
    /// String value
    String(String),
    /// Ordered list of values
    List(Vec<MetadataValue>),
    /// Nested map
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    /// Type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            MetadataValue::Null => "null",
            MetadataValue::Bool(_) => "bool",
            MetadataValue::Number(_) => "number",
            MetadataValue::String(_) => "string",
            MetadataValue::List(_) => "list",
            MetadataValue::Map(_) => "map",
        }
    }

    /// Numeric view, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String view, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, if this is a number with no fractional part
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            MetadataValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64 => {
                Some(*n as u64)
            }
            _ => None,
        }
    }

    /// Order two values of the same scalar type
    ///
    /// Numbers compare numerically, strings lexicographically, bools
    /// false < true. Any other pairing (mixed types, lists, maps, NaN) is
    /// unordered and returns `None`.
    pub fn partial_cmp_scalar(&self, other: &MetadataValue) -> Option<Ordering> {
        match (self, other) {
            (MetadataValue::Number(a), MetadataValue::Number(b)) => a.partial_cmp(b),
            (MetadataValue::String(a), MetadataValue::String(b)) => Some(a.cmp(b)),
            (MetadataValue::Bool(a), MetadataValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Canonical string form, used as a grouping key
    pub fn canonical_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Convert from a JSON value
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MetadataValue::Null,
            serde_json::Value::Bool(b) => MetadataValue::Bool(b),
            serde_json::Value::Number(n) => MetadataValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => MetadataValue::String(s),
            serde_json::Value::Array(items) => {
                MetadataValue::List(items.into_iter().map(MetadataValue::from_json).collect())
            }
            serde_json::Value::Object(map) => MetadataValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, MetadataValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl From<i32> for MetadataValue {
    fn from(v: i32) -> Self {
        MetadataValue::Number(v as f64)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Number(v as f64)
    }
}

impl From<u64> for MetadataValue {
    fn from(v: u64) -> Self {
        MetadataValue::Number(v as f64)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Number(v)
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::String(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::String(v.to_string())
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(v: Vec<T>) -> Self {
        MetadataValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// Build a [`Metadata`] map from key/value pairs
///
/// ```
/// use vexil_core::value::metadata;
///
/// let meta = metadata([("category", "news".into()), ("year", 2024.into())]);
/// assert_eq!(meta.len(), 2);
/// ```
pub fn metadata<const N: usize>(pairs: [(&str, MetadataValue); N]) -> Metadata {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
