//! Relation-aware repositories.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::QueryResult;
use crate::middleware::FetchContext;
use crate::model::ModelRef;
use crate::query::{FindKind, FindQuery};
use crate::record::{FetchResult, Record};
use crate::relations::{
    Binding, RegistryHandle, RelationConfig, RelationDescriptor, RelationKind, RelationLookup,
    RelationRegistry, Scope,
};

/// Fetch and bind operations for one model.
///
/// A repository composes the model identity, the model's relation registry
/// and a shared [`Connection`]. Cloning a repository shares its registry.
///
/// ```rust,ignore
/// let posts = Repository::new(ModelRef::new("Post"), connection.clone());
/// posts.bind(
///     RelationKind::HasMany,
///     "Comments",
///     RelationConfig::new().to("Comment").alternate().key("post_id"),
/// )?;
///
/// let rows = posts.find_all(FindQuery::all().with("Comments")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Repository {
    model: ModelRef,
    registry: RegistryHandle,
    connection: Arc<Connection>,
}

impl Repository {
    /// Create a repository with an empty registry.
    pub fn new(model: ModelRef, connection: Arc<Connection>) -> Self {
        Self::with_registry(model, RelationRegistry::shared(), connection)
    }

    /// Create a repository around an existing registry.
    pub fn with_registry(
        model: ModelRef,
        registry: RegistryHandle,
        connection: Arc<Connection>,
    ) -> Self {
        Self {
            model,
            registry,
            connection,
        }
    }

    /// The model this repository fetches.
    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// The model's relation registry.
    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    /// The connection fetches run on.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Bind a relation, natively or as alternate.
    pub fn bind(
        &self,
        kind: RelationKind,
        name: &str,
        config: RelationConfig,
    ) -> QueryResult<Binding> {
        let mut registry = self.registry.write();
        self.connection
            .binder()
            .bind(&mut registry, &self.model, kind, name, &config)
    }

    /// Look up a relation by name, or the relation names of a kind.
    pub fn relation(&self, name: &str, scope: Scope) -> Option<RelationLookup> {
        self.registry.read().get(name, scope)
    }

    /// All relations in scope.
    pub fn relations(&self, scope: Scope) -> Vec<RelationDescriptor> {
        self.registry
            .read()
            .relations(scope)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Merge `patch` (relation name → partial options) into the relations
    /// of `kind` and rebind them.
    ///
    /// The first override captures the state [`reset_relations`](Self::reset_relations)
    /// restores. An empty patch does nothing. The rebind runs on a staged copy
    /// of the registry; if any relation fails to bind, the registry is left as
    /// it was.
    pub fn override_kind(
        &self,
        kind: RelationKind,
        patch: &IndexMap<String, Value>,
    ) -> QueryResult<()> {
        let mut registry = self.registry.write();
        let mut staged = registry.clone();
        let rebind = staged.override_kind(kind, patch)?;
        if rebind.is_empty() {
            return Ok(());
        }

        let binder = self.connection.binder();
        for (name, config) in &rebind {
            binder.bind(&mut staged, &self.model, kind, name, config)?;
        }
        *registry = staged;

        info!(
            model = %self.model.name,
            kind = %kind,
            relations = rebind.len(),
            "Relations overridden"
        );
        Ok(())
    }

    /// Like [`override_kind`](Self::override_kind) with the kind given by
    /// name (`hasMany`, ...). Returns `false` without changes when the name
    /// is not a relation kind.
    pub fn override_relation(
        &self,
        kind: &str,
        patch: &IndexMap<String, Value>,
    ) -> QueryResult<bool> {
        let Ok(kind) = kind.parse::<RelationKind>() else {
            debug!(
                model = %self.model.name,
                kind = %kind,
                "Not a relation kind, override ignored"
            );
            return Ok(false);
        };
        self.override_kind(kind, patch)?;
        Ok(true)
    }

    /// Restore the relations bound before the first override.
    ///
    /// Returns `false` when no override ever happened.
    pub fn reset_relations(&self) -> bool {
        let restored = self.registry.write().reset();
        if restored {
            info!(model = %self.model.name, "Relations reset");
        }
        restored
    }

    /// Run `query` through the connection's pipeline.
    pub async fn find(&self, query: FindQuery) -> QueryResult<FetchResult> {
        let ctx = FetchContext::new(self.model.clone(), self.registry.clone(), query);
        self.connection.execute(ctx).await
    }

    /// Fetch every matching record.
    pub async fn find_all(&self, query: FindQuery) -> QueryResult<Vec<Record>> {
        let query = FindQuery {
            kind: FindKind::All,
            ..query
        };
        Ok(self.find(query).await?.into_records())
    }

    /// Fetch the first matching record.
    pub async fn find_first(&self, query: FindQuery) -> QueryResult<Option<Record>> {
        let query = FindQuery {
            kind: FindKind::First,
            ..query
        };
        Ok(self.find(query).await?.into_single())
    }
}
