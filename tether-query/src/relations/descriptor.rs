//! Bound relation descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryResult;
use crate::merge::merge_typed;
use crate::model::ModelRef;

use super::config::RelationOptions;
use super::kind::{Cardinality, RelationKind};

/// A bound relation between two models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Relation kind.
    pub kind: RelationKind,
    /// Relation name.
    pub name: String,
    /// Owning model.
    pub from: ModelRef,
    /// Target model.
    pub to: ModelRef,
    /// Key mapping with a single `local → foreign` entry.
    pub key: IndexMap<String, String>,
    /// Field on the parent record receiving the related value.
    pub field_name: String,
    /// Query options applied to the batch query.
    pub options: RelationOptions,
    /// Whether the host resolves this relation itself.
    pub is_native: bool,
}

impl RelationDescriptor {
    /// Create a descriptor with a `local → foreign` key and default options.
    pub fn new(
        kind: RelationKind,
        name: impl Into<String>,
        from: ModelRef,
        to: ModelRef,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        let mut key = IndexMap::new();
        key.insert(local_key.into(), foreign_key.into());
        Self {
            kind,
            name: name.into(),
            from,
            to,
            key,
            field_name: field_name.into(),
            options: RelationOptions::default(),
            is_native: false,
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: RelationOptions) -> Self {
        self.options = options;
        self
    }

    /// Mark the descriptor as native.
    pub fn native(mut self) -> Self {
        self.is_native = true;
        self
    }

    /// Cardinality of the attached value.
    pub fn cardinality(&self) -> Cardinality {
        self.kind.cardinality()
    }

    /// Field read from each parent record.
    pub fn local_key(&self) -> Option<&str> {
        self.key.keys().next().map(String::as_str)
    }

    /// Field matched on the related records.
    pub fn foreign_key(&self) -> Option<&str> {
        self.key.values().next().map(String::as_str)
    }

    /// A working copy with `patch` merged into its options.
    pub fn merged(&self, patch: &Value) -> QueryResult<Self> {
        let options = merge_typed(&self.options, patch, &self.name)?;
        Ok(self.clone().with_options(options))
    }
}
