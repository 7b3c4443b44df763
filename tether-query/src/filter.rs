//! Filter types for query conditions.
//!
//! Filters are handed to the [`QueryEngine`](crate::traits::QueryEngine)
//! untouched; this crate never renders them into a query language. The
//! in-memory evaluation in [`Filter::matches`] exists for
//! [`MemoryEngine`](crate::memory::MemoryEngine) and for hosts that post-filter.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// List of values.
    List(Vec<FilterValue>),
    /// JSON value.
    Json(Value),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert a stored JSON field into a filter value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(_) => Self::Json(value.clone()),
        }
    }

    /// Convert back into a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Json(v) => v.clone(),
        }
    }

    /// Canonical string form used to bucket related rows by key.
    ///
    /// Integers, integral floats and numeric strings collapse onto the same
    /// key, so `1`, `1.0` and `"1"` land in one bucket. Drivers that hand back
    /// every column as text still match numeric parent keys.
    pub fn bucket_key(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", *f as i64)
            }
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::List(_) | Self::Json(_) => self.to_json().to_string(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Loose equality: scalars compare by bucket key.
    pub fn loose_eq(&self, other: &FilterValue) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            _ => self.bucket_key() == other.bucket_key(),
        }
    }

    pub(crate) fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => match (self, other) {
                (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
                (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
                _ => None,
            },
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// A complete filter condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// No filter (always true).
    #[default]
    None,

    /// Equals comparison.
    Equals(String, FilterValue),
    /// Not equals comparison.
    NotEquals(String, FilterValue),

    /// Less than comparison.
    Lt(String, FilterValue),
    /// Less than or equal comparison.
    Lte(String, FilterValue),
    /// Greater than comparison.
    Gt(String, FilterValue),
    /// Greater than or equal comparison.
    Gte(String, FilterValue),

    /// In a list of values.
    In(String, Vec<FilterValue>),
    /// Not in a list of values.
    NotIn(String, Vec<FilterValue>),

    /// Contains a substring.
    Contains(String, FilterValue),
    /// Starts with a prefix.
    StartsWith(String, FilterValue),
    /// Ends with a suffix.
    EndsWith(String, FilterValue),

    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),

    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Create an AND filter.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.remove(0),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.remove(0),
            _ => Self::Or(filters),
        }
    }

    /// Create a NOT filter.
    pub fn not(filter: Filter) -> Self {
        if filter.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(filter))
    }

    /// Combine with another filter using AND.
    pub fn and_then(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Build a filter from a condition map.
    ///
    /// Each entry is an equality test; a list value becomes an `IN` test and
    /// a null value an `IS NULL` test.
    pub fn from_conditions(conditions: &IndexMap<String, FilterValue>) -> Self {
        Self::and(conditions.iter().map(|(field, value)| match value {
            FilterValue::List(values) => Self::In(field.clone(), values.clone()),
            FilterValue::Null => Self::IsNull(field.clone()),
            other => Self::Equals(field.clone(), other.clone()),
        }))
    }

    /// Evaluate this filter against a record.
    ///
    /// A list-valued field matches an equality or `IN` test when any of its
    /// elements does, which is how document stores treat array fields.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::None => true,
            Self::Equals(field, value) => field_any(record, field, |v| v.loose_eq(value)),
            Self::NotEquals(field, value) => !field_any(record, field, |v| v.loose_eq(value)),
            Self::Lt(field, value) => field_cmp(record, field, value, Ordering::is_lt),
            Self::Lte(field, value) => field_cmp(record, field, value, Ordering::is_le),
            Self::Gt(field, value) => field_cmp(record, field, value, Ordering::is_gt),
            Self::Gte(field, value) => field_cmp(record, field, value, Ordering::is_ge),
            Self::In(field, values) => {
                field_any(record, field, |v| values.iter().any(|x| v.loose_eq(x)))
            }
            Self::NotIn(field, values) => {
                !field_any(record, field, |v| values.iter().any(|x| v.loose_eq(x)))
            }
            Self::Contains(field, value) => field_str(record, field, value, |s, p| s.contains(p)),
            Self::StartsWith(field, value) => {
                field_str(record, field, value, |s, p| s.starts_with(p))
            }
            Self::EndsWith(field, value) => field_str(record, field, value, |s, p| s.ends_with(p)),
            Self::IsNull(field) => record.get(field).is_none_or(Value::is_null),
            Self::IsNotNull(field) => record.get(field).is_some_and(|v| !v.is_null()),
            Self::And(filters) => filters.iter().all(|f| f.matches(record)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(record)),
            Self::Not(filter) => !filter.matches(record),
        }
    }
}

fn field_any(record: &Record, field: &str, pred: impl Fn(&FilterValue) -> bool) -> bool {
    match record.get(field).map(FilterValue::from_json) {
        None => false,
        Some(FilterValue::List(items)) => items.iter().any(&pred),
        Some(value) => pred(&value),
    }
}

fn field_cmp(
    record: &Record,
    field: &str,
    value: &FilterValue,
    accept: fn(Ordering) -> bool,
) -> bool {
    record
        .get(field)
        .map(FilterValue::from_json)
        .and_then(|v| v.compare(value))
        .is_some_and(accept)
}

fn field_str(
    record: &Record,
    field: &str,
    value: &FilterValue,
    accept: fn(&str, &str) -> bool,
) -> bool {
    match (record.get(field), value) {
        (Some(Value::String(s)), FilterValue::String(p)) => accept(s, p),
        _ => false,
    }
}
