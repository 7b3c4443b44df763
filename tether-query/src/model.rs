//! Model identities and a catalog-backed locator.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::traits::ModelLocator;

/// Identity of a model: its name, primary key, and the backend it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef {
    /// Model name (e.g. `Post`).
    pub name: String,
    /// Primary key field.
    pub primary_key: String,
    /// Named backend holding this model's records; `None` means the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
}

impl ModelRef {
    /// Create a model reference with the conventional `id` primary key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: "id".to_string(),
            connection: None,
        }
    }

    /// Set the primary key field.
    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    /// Place the model on a named backend.
    pub fn on_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }
}

/// Locator backed by an explicit catalog of models.
///
/// Lookups match the registered name exactly first, then case-insensitively.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    models: RwLock<IndexMap<String, ModelRef>>,
}

impl ModelCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model (builder pattern).
    pub fn with(self, model: ModelRef) -> Self {
        self.register(model);
        self
    }

    /// Register or replace a model.
    pub fn register(&self, model: ModelRef) {
        self.models.write().insert(model.name.clone(), model);
    }

    /// Remove a model from the catalog.
    pub fn unregister(&self, name: &str) -> Option<ModelRef> {
        self.models.write().shift_remove(name)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}

impl ModelLocator for ModelCatalog {
    fn locate(&self, name: &str) -> Option<ModelRef> {
        let models = self.models.read();
        models.get(name).cloned().or_else(|| {
            models
                .values()
                .find(|m| m.name.eq_ignore_ascii_case(name))
                .cloned()
        })
    }
}
