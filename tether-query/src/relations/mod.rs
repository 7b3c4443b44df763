//! Relation declarations, descriptors and the per-model registry.
//!
//! This module provides the types a model uses to describe its relations:
//! - `RelationConfig` for declaring a relation (`to`, `default`, `key`, ...)
//! - `RelationDescriptor` for a bound relation
//! - `RelationRegistry` for the native and alternate relation sets
//! - `RelationBinder` for deciding which set a relation belongs to
//!
//! ## Example
//!
//! ```rust,ignore
//! // Comments live on another backend; resolve them in one batch query
//! repo.bind(
//!     RelationKind::HasMany,
//!     "Comments",
//!     RelationConfig::new().to("Comment").alternate().key("post_id"),
//! )?;
//!
//! let posts = repo.find_all(FindQuery::all().with("Comments")).await?;
//! ```

mod binder;
mod config;
mod descriptor;
mod kind;
mod registry;

pub use binder::{Binding, ConventionBinder, RelationBinder};
pub use config::{KeySpec, RelationConfig, RelationOptions};
pub use descriptor::RelationDescriptor;
pub use kind::{Cardinality, RelationKind};
pub use registry::{RegistryHandle, RelationLookup, RelationRegistry, Scope};
