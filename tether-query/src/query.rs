//! Find queries and requested relation entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::Filter;
use crate::types::OrderByField;

/// Whether a find returns every match or only the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindKind {
    /// Return all matching records.
    #[default]
    All,
    /// Return the first matching record.
    First,
}

/// A requested relation: a bare name, or a name with suboptions.
///
/// Suboptions are a JSON object merged into the relation's options for this
/// fetch only (e.g. `{"limit": 5}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WithEntry {
    /// A bare relation name.
    Name(String),
    /// A relation name with suboptions.
    Nested(String, Value),
}

impl WithEntry {
    /// Create a bare entry.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Create an entry carrying suboptions.
    pub fn nested(name: impl Into<String>, options: Value) -> Self {
        Self::Nested(name.into(), options)
    }

    /// The relation name this entry refers to.
    pub fn relation_name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Nested(name, _) => name,
        }
    }

    /// Suboptions, when present and non-empty.
    pub fn suboptions(&self) -> Option<&Value> {
        match self {
            Self::Nested(_, options) if !is_empty_value(options) => Some(options),
            _ => None,
        }
    }
}

impl From<&str> for WithEntry {
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<String> for WithEntry {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Options for a find operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    /// All or first.
    pub kind: FindKind,
    /// Filter conditions.
    pub conditions: Filter,
    /// Projection; `None` selects every field.
    pub fields: Option<Vec<String>>,
    /// Grouping fields, passed through to the engine.
    pub group: Option<Vec<String>>,
    /// Ordering.
    pub order: Vec<OrderByField>,
    /// Maximum number of records.
    pub limit: Option<u64>,
    /// Relations for the host to resolve natively.
    pub with: Vec<WithEntry>,
    /// Relations resolved by the batch resolver.
    pub alternate_with: Vec<WithEntry>,
}

impl FindQuery {
    /// A query returning all matching records.
    pub fn all() -> Self {
        Self::default()
    }

    /// A query returning the first matching record.
    pub fn first() -> Self {
        Self {
            kind: FindKind::First,
            ..Self::default()
        }
    }

    /// Set the filter.
    pub fn r#where(mut self, filter: impl Into<Filter>) -> Self {
        self.conditions = filter.into();
        self
    }

    /// Set the projection.
    pub fn fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Add an ordering.
    pub fn order_by(mut self, order: OrderByField) -> Self {
        self.order.push(order);
        self
    }

    /// Limit the number of records.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Request a relation.
    pub fn with(mut self, entry: impl Into<WithEntry>) -> Self {
        self.with.push(entry.into());
        self
    }

    /// Request several relations.
    pub fn with_many(mut self, entries: impl IntoIterator<Item = impl Into<WithEntry>>) -> Self {
        self.with.extend(entries.into_iter().map(Into::into));
        self
    }
}
