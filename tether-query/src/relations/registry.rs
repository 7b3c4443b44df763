//! Per-model registry of native and alternate relations.
//!
//! A relation name lives in at most one of the two subsets. The registry
//! also keeps every declaration so that an override can rebuild the
//! relations of one kind from merged configuration. The first override
//! captures a snapshot; [`reset`](RelationRegistry::reset) restores it.
//!
//! Overrides and resets are meant for initialization. A reset racing with
//! fetches on another thread may be observed half-applied by a fetch that
//! clones descriptors in between; the write lock only makes each swap atomic.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::QueryResult;
use crate::merge::merge_typed;

use super::config::RelationConfig;
use super::descriptor::RelationDescriptor;
use super::kind::RelationKind;

/// Shared handle to a model's registry.
pub type RegistryHandle = Arc<RwLock<RelationRegistry>>;

/// Which subset of relations a lookup consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Relations bound by the host.
    #[default]
    Native,
    /// Relations resolved by the batch resolver.
    Alternate,
    /// Both subsets.
    All,
}

/// Result of a registry lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationLookup {
    /// The name matched a relation.
    Relation(RelationDescriptor),
    /// The name matched a relation kind; these are the relation names of that kind.
    Names(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Default)]
struct RegistrySnapshot {
    native: IndexMap<String, RelationDescriptor>,
    alternate: IndexMap<String, RelationDescriptor>,
    declarations: IndexMap<RelationKind, IndexMap<String, RelationConfig>>,
}

/// Native and alternate relations of one model.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    native: IndexMap<String, RelationDescriptor>,
    alternate: IndexMap<String, RelationDescriptor>,
    declarations: IndexMap<RelationKind, IndexMap<String, RelationConfig>>,
    snapshot: Option<RegistrySnapshot>,
}

impl RelationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry behind a shared handle.
    pub fn shared() -> RegistryHandle {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Record the configuration a relation was declared with.
    pub fn declare(&mut self, kind: RelationKind, name: impl Into<String>, config: RelationConfig) {
        self.declarations
            .entry(kind)
            .or_default()
            .insert(name.into(), config);
    }

    /// Declared configuration of a relation.
    pub fn declaration(&self, kind: RelationKind, name: &str) -> Option<&RelationConfig> {
        self.declarations.get(&kind).and_then(|d| d.get(name))
    }

    /// Register a bound descriptor in the subset its `is_native` flag selects,
    /// removing the name from the other subset.
    pub fn insert(&mut self, descriptor: RelationDescriptor) {
        let name = descriptor.name.clone();
        if descriptor.is_native {
            self.alternate.shift_remove(&name);
            self.native.insert(name, descriptor);
        } else {
            self.native.shift_remove(&name);
            self.alternate.insert(name, descriptor);
        }
    }

    /// Alternate descriptor by relation name.
    pub fn alternate(&self, name: &str) -> Option<&RelationDescriptor> {
        self.alternate.get(name)
    }

    /// Native descriptor by relation name.
    pub fn native(&self, name: &str) -> Option<&RelationDescriptor> {
        self.native.get(name)
    }

    /// Whether any alternate relation is registered.
    pub fn has_alternate(&self) -> bool {
        !self.alternate.is_empty()
    }

    /// All descriptors in scope, native first.
    pub fn relations(&self, scope: Scope) -> Vec<&RelationDescriptor> {
        match scope {
            Scope::Native => self.native.values().collect(),
            Scope::Alternate => self.alternate.values().collect(),
            Scope::All => self.native.values().chain(self.alternate.values()).collect(),
        }
    }

    /// Look up `name` in scope.
    ///
    /// A relation name returns its descriptor. A kind name (`hasMany`, ...)
    /// returns the names of the relations of that kind in scope.
    pub fn get(&self, name: &str, scope: Scope) -> Option<RelationLookup> {
        let found = match scope {
            Scope::Native => self.native.get(name),
            Scope::Alternate => self.alternate.get(name),
            Scope::All => self.alternate.get(name).or_else(|| self.native.get(name)),
        };
        if let Some(descriptor) = found {
            return Some(RelationLookup::Relation(descriptor.clone()));
        }

        let kind: RelationKind = name.parse().ok()?;
        Some(RelationLookup::Names(
            self.relations(scope)
                .into_iter()
                .filter(|d| d.kind == kind)
                .map(|d| d.name.clone())
                .collect(),
        ))
    }

    /// Merge `patch` (relation name → partial configuration) into the
    /// declarations of `kind`.
    ///
    /// The first effective override captures the snapshot used by
    /// [`reset`](Self::reset). Relations declared under `kind` are removed
    /// from both subsets and returned, in declaration order, for rebinding.
    /// Names in `patch` that were never declared become new declarations.
    /// An empty patch changes nothing.
    pub fn override_kind(
        &mut self,
        kind: RelationKind,
        patch: &IndexMap<String, Value>,
    ) -> QueryResult<Vec<(String, RelationConfig)>> {
        if patch.is_empty() {
            return Ok(Vec::new());
        }

        let declared = self.declarations.get(&kind).cloned().unwrap_or_default();
        let mut merged = declared.clone();
        for (name, partial) in patch {
            let base = declared.get(name).cloned().unwrap_or_default();
            merged.insert(name.clone(), merge_typed(&base, partial, name)?);
        }

        if self.snapshot.is_none() {
            self.snapshot = Some(RegistrySnapshot {
                native: self.native.clone(),
                alternate: self.alternate.clone(),
                declarations: self.declarations.clone(),
            });
        }

        for name in merged.keys() {
            self.native.shift_remove(name);
            self.alternate.shift_remove(name);
        }
        self.declarations.insert(kind, merged.clone());

        Ok(merged.into_iter().collect())
    }

    /// Whether an override has captured a snapshot.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Restore the state captured before the first override.
    ///
    /// Returns `false` (and changes nothing) when no override ever happened.
    pub fn reset(&mut self) -> bool {
        match &self.snapshot {
            Some(snapshot) => {
                self.native = snapshot.native.clone();
                self.alternate = snapshot.alternate.clone();
                self.declarations = snapshot.declarations.clone();
                true
            }
            None => false,
        }
    }
}
