//! Metadata filtering
//!
//! A [`MetadataFilter`] is a conjunction of per-field conditions. Each
//! condition is either direct equality or one of the comparison operators
//! in [`FilterOp`].
//!
//! The JSON form mirrors the usual document-store syntax:
//!
//! ```text
//! {"category": "news"}                      equality
//! {"year": {"$gte": 2020, "$lte": 2024}}    range (two conditions)
//! {"lang": {"$in": ["en", "de"]}}           membership
//! {"year": {"$eq": 2024}}                   explicit equality
//! ```
//!
//! Unrecognized `$` operators are kept as [`FilterOp::Unknown`] and make the
//! condition evaluate to `false`. Filtering never fails.

use crate::error::{VectorError, VectorResult};
use crate::value::{Metadata, MetadataValue};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Comparison applied to a single metadata field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Field equals the value
    Eq(MetadataValue),
    /// Field is greater than or equal to the value
    Gte(MetadataValue),
    /// Field is less than or equal to the value
    Lte(MetadataValue),
    /// Field equals one of the values
    In(Vec<MetadataValue>),
    /// Unrecognized operator, kept with its operand; always evaluates to false
    Unknown {
        /// Operator as written, including the `$`
        op: String,
        /// Operand as written
        operand: MetadataValue,
    },
}

impl FilterOp {
    /// Evaluate against a field value (`None` when the field is absent)
    pub fn evaluate(&self, actual: Option<&MetadataValue>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self {
            FilterOp::Eq(expected) => values_equal(actual, expected),
            FilterOp::Gte(bound) => matches!(
                actual.partial_cmp_scalar(bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lte(bound) => matches!(
                actual.partial_cmp_scalar(bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::In(options) => options.iter().any(|v| values_equal(actual, v)),
            FilterOp::Unknown { .. } => false,
        }
    }
}

/// Equality with numeric tolerance
fn values_equal(a: &MetadataValue, b: &MetadataValue) -> bool {
    match (a, b) {
        (MetadataValue::Number(x), MetadataValue::Number(y)) => (x - y).abs() < f64::EPSILON,
        _ => a == b,
    }
}

/// A single field condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Top-level metadata field name
    pub field: String,
    /// Operator and operand
    pub op: FilterOp,
}

/// Metadata filter (AND of all conditions)
///
/// Serializes to and from the JSON filter syntax shown in the module docs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct MetadataFilter {
    /// Conditions; all must match
    pub conditions: Vec<FilterCondition>,
}

impl MetadataFilter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        MetadataFilter {
            conditions: Vec::new(),
        }
    }

    /// Add an equality condition
    pub fn eq(self, field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.with(field, FilterOp::Eq(value.into()))
    }

    /// Add a `>=` condition
    pub fn gte(self, field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.with(field, FilterOp::Gte(value.into()))
    }

    /// Add a `<=` condition
    pub fn lte(self, field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.with(field, FilterOp::Lte(value.into()))
    }

    /// Add a membership condition
    pub fn is_in<V: Into<MetadataValue>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.with(
            field,
            FilterOp::In(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Add an arbitrary condition
    pub fn with(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        self.conditions.push(FilterCondition {
            field: field.into(),
            op,
        });
        self
    }

    /// Parse the JSON filter syntax
    ///
    /// The top level must be an object. A field whose value is an object
    /// made only of `$`-prefixed keys becomes one condition per operator;
    /// any other value is direct equality.
    ///
    /// # Errors
    /// - `InvalidArgument` if the top level is not an object, or `$in` is
    ///   given a non-array operand
    pub fn from_json(value: &serde_json::Value) -> VectorResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| VectorError::invalid("filter must be a JSON object"))?;

        let mut filter = MetadataFilter::new();
        for (field, spec) in obj {
            match spec.as_object() {
                Some(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
                    for (op, operand) in ops {
                        let parsed = parse_op(field, op, operand)?;
                        filter = filter.with(field.clone(), parsed);
                    }
                }
                _ => {
                    filter = filter.with(
                        field.clone(),
                        FilterOp::Eq(MetadataValue::from_json(spec.clone())),
                    );
                }
            }
        }
        Ok(filter)
    }

    /// Render in the JSON filter syntax
    ///
    /// A field with a single equality condition renders as a plain value;
    /// any other field renders as an operator object.
    pub fn to_json(&self) -> serde_json::Value {
        let mut fields: Vec<(&str, Vec<&FilterOp>)> = Vec::new();
        for c in &self.conditions {
            match fields.iter_mut().find(|(f, _)| *f == c.field) {
                Some((_, ops)) => ops.push(&c.op),
                None => fields.push((&c.field, vec![&c.op])),
            }
        }

        let mut obj = serde_json::Map::new();
        for (field, ops) in fields {
            let spec = match ops.as_slice() {
                [FilterOp::Eq(v)] if !is_operator_object(v) => value_json(v),
                _ => {
                    let mut spec = serde_json::Map::new();
                    for op in ops {
                        let (key, operand) = match op {
                            FilterOp::Eq(v) => ("$eq".to_string(), value_json(v)),
                            FilterOp::Gte(v) => ("$gte".to_string(), value_json(v)),
                            FilterOp::Lte(v) => ("$lte".to_string(), value_json(v)),
                            FilterOp::In(vs) => (
                                "$in".to_string(),
                                serde_json::Value::Array(vs.iter().map(value_json).collect()),
                            ),
                            FilterOp::Unknown { op, operand } => (op.clone(), value_json(operand)),
                        };
                        spec.insert(key, operand);
                    }
                    serde_json::Value::Object(spec)
                }
            };
            obj.insert(field.to_string(), spec);
        }
        serde_json::Value::Object(obj)
    }

    /// Check if metadata matches this filter
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.conditions
            .iter()
            .all(|c| c.op.evaluate(metadata.get(&c.field)))
    }

    /// Check if filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Get the number of conditions in the filter
    pub fn len(&self) -> usize {
        self.conditions.len()
    }
}

fn value_json(value: &MetadataValue) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// An equality operand that would read back as operators
fn is_operator_object(value: &MetadataValue) -> bool {
    match value {
        MetadataValue::Map(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

impl TryFrom<serde_json::Value> for MetadataFilter {
    type Error = VectorError;

    fn try_from(value: serde_json::Value) -> VectorResult<Self> {
        MetadataFilter::from_json(&value)
    }
}

impl From<MetadataFilter> for serde_json::Value {
    fn from(filter: MetadataFilter) -> Self {
        filter.to_json()
    }
}

fn parse_op(field: &str, op: &str, operand: &serde_json::Value) -> VectorResult<FilterOp> {
    let parsed = match op {
        "$eq" => FilterOp::Eq(MetadataValue::from_json(operand.clone())),
        "$gte" => FilterOp::Gte(MetadataValue::from_json(operand.clone())),
        "$lte" => FilterOp::Lte(MetadataValue::from_json(operand.clone())),
        "$in" => {
            let items = operand.as_array().ok_or_else(|| {
                VectorError::invalid(format!("'$in' on field '{}' requires an array", field))
            })?;
            FilterOp::In(items.iter().cloned().map(MetadataValue::from_json).collect())
        }
        other => FilterOp::Unknown {
            op: other.to_string(),
            operand: MetadataValue::from_json(operand.clone()),
        },
    };
    Ok(parsed)
}

/// Evaluate an optional filter (absent filter matches everything)
pub fn matches_opt(filter: Option<&MetadataFilter>, metadata: &Metadata) -> bool {
    filter.map_or(true, |f| f.matches(metadata))
}
