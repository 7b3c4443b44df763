//! Relation declarations and their options.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::filter::{Filter, FilterValue};
use crate::types::OrderByField;

/// Query options carried by a relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationOptions {
    /// Base conditions on the related model (field → value; a list means IN).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub conditions: IndexMap<String, FilterValue>,
    /// Projection on the related model; `None` selects every field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Fields whose value tuple de-duplicates each parent's related records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<String>>,
    /// Ordering of the batch query.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<OrderByField>,
    /// Limit of the batch query (applies to the whole batch, not per parent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl RelationOptions {
    /// Base conditions as a filter.
    pub fn filter(&self) -> Filter {
        Filter::from_conditions(&self.conditions)
    }
}

/// How a relation's key was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySpec {
    /// A single field: the foreign key for `hasOne`/`hasMany`, the local key
    /// for `belongsTo`.
    Field(String),
    /// An explicit `{local: foreign}` mapping, used verbatim.
    Map(IndexMap<String, String>),
}

/// Configuration passed to `bind`.
///
/// Serialized with camelCase keys (`fieldName`), which is also the shape
/// accepted by overrides and per-request suboptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationConfig {
    /// Target model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Alias for `to`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// `Some(false)` requests an alternate relation; `Some(true)` forces the
    /// native binder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    /// Field on the parent record that receives the related value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Key declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeySpec>,
    /// Query options.
    #[serde(flatten)]
    pub options: RelationOptions,
}

impl RelationConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target model.
    pub fn to(mut self, model: impl Into<String>) -> Self {
        self.to = Some(model.into());
        self
    }

    /// Set the target model through the `class` alias.
    pub fn class(mut self, model: impl Into<String>) -> Self {
        self.class = Some(model.into());
        self
    }

    /// Request an alternate relation (`default: false`).
    pub fn alternate(mut self) -> Self {
        self.default = Some(false);
        self
    }

    /// Force native binding (`default: true`).
    pub fn native(mut self) -> Self {
        self.default = Some(true);
        self
    }

    /// Set the attachment field.
    pub fn field_name(mut self, field: impl Into<String>) -> Self {
        self.field_name = Some(field.into());
        self
    }

    /// Declare the key as a single field.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(KeySpec::Field(key.into()));
        self
    }

    /// Declare the key as an explicit `local → foreign` mapping.
    pub fn key_map(mut self, local: impl Into<String>, foreign: impl Into<String>) -> Self {
        let mut map = IndexMap::new();
        map.insert(local.into(), foreign.into());
        self.key = Some(KeySpec::Map(map));
        self
    }

    /// Add a base condition.
    pub fn condition(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.options.conditions.insert(field.into(), value.into());
        self
    }

    /// Set the projection.
    pub fn fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set the de-duplication fields.
    pub fn group(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options.group = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Add an ordering.
    pub fn order_by(mut self, order: OrderByField) -> Self {
        self.options.order.push(order);
        self
    }

    /// Limit the batch query.
    pub fn limit(mut self, n: u64) -> Self {
        self.options.limit = Some(n);
        self
    }

    /// Target model name: `to`, then `class`, then the relation name.
    pub fn target_name<'a>(&'a self, relation: &'a str) -> &'a str {
        self.to
            .as_deref()
            .or(self.class.as_deref())
            .unwrap_or(relation)
    }
}
