//! # tether-query
//!
//! Relation registry and batched eager-loading engine for Tether.
//!
//! This crate layers alternate relations on top of a host data mapper:
//! - Per-model relation registry split into native and alternate sets
//! - Bind-time decision between the host's binder and alternate relations
//! - A named fetch pipeline with pre-fetch and post-fetch stages
//! - Batched resolution: one query per alternate relation for a whole result set
//! - Override and reset of relation options
//!
//! ## Declaring Relations
//!
//! ```rust
//! use tether_query::{RelationConfig, RelationKind};
//!
//! // `default: false` asks for an alternate relation
//! let comments = RelationConfig::new()
//!     .to("Comment")
//!     .alternate()
//!     .key("post_id")
//!     .condition("published", true)
//!     .limit(50);
//!
//! assert_eq!(comments.target_name("Comments"), "Comment");
//! assert_eq!("hasMany".parse::<RelationKind>().unwrap(), RelationKind::HasMany);
//! ```
//!
//! ## Fetching
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tether_query::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let engine = MemoryEngine::new()
//!     .with_json("Post", json!([{"id": 1}, {"id": 2}]))
//!     .with_json("Comment", json!([
//!         {"id": 10, "post_id": 1},
//!         {"id": 11, "post_id": 1},
//!     ]));
//!
//! let connection = Arc::new(
//!     Connection::builder(engine)
//!         .model(ModelRef::new("Post"))
//!         .model(ModelRef::new("Comment"))
//!         .build(),
//! );
//!
//! let posts = Repository::new(ModelRef::new("Post"), connection);
//! posts.bind(
//!     RelationKind::HasMany,
//!     "Comments",
//!     RelationConfig::new().to("Comment").alternate().key("post_id"),
//! )?;
//!
//! let rows = posts.find_all(FindQuery::all().with("Comments")).await?;
//! assert_eq!(rows[0]["comments"].as_array().map(Vec::len), Some(2));
//! assert_eq!(rows[1]["comments"], json!([]));
//! # Ok::<(), QueryError>(())
//! # }).unwrap();
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use tether_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::relation_not_found("Post", "Comments");
//! assert_eq!(err.code, ErrorCode::RelationNotFound);
//! assert_eq!(err.code.code(), "T1012");
//! ```

pub mod config;
pub mod connection;
pub mod eager;
pub mod error;
pub mod filter;
pub mod inflector;
pub mod logging;
pub mod memory;
pub mod merge;
pub mod middleware;
pub mod model;
pub mod query;
pub mod record;
pub mod relations;
pub mod repository;
pub mod traits;
pub mod types;

pub use config::{DebugConfig, RelationsConfig, TetherConfig};
pub use connection::{Connection, ConnectionBuilder, EngineRouter};
pub use eager::{BatchResolver, BatchResult, SearchPlan, WithTranslator};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use filter::{Filter, FilterValue};
pub use inflector::EnglishInflector;
pub use memory::MemoryEngine;
pub use middleware::{FetchContext, Middleware, MiddlewareChain, MiddlewareResult, Next};
pub use model::{ModelCatalog, ModelRef};
pub use query::{FindKind, FindQuery, WithEntry};
pub use record::{FetchResult, Record};
pub use relations::{
    Binding, Cardinality, ConventionBinder, KeySpec, RegistryHandle, RelationBinder,
    RelationConfig, RelationDescriptor, RelationKind, RelationLookup, RelationOptions,
    RelationRegistry, Scope,
};
pub use repository::Repository;
pub use traits::{BoxFuture, Inflector, ModelLocator, NativeBinder, QueryEngine, ValueCoercer};
pub use types::{OrderByField, SortOrder};

// Re-export logging utilities
pub use logging::{get_log_format, get_log_level, init as init_logging, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::connection::Connection;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{Filter, FilterValue};
    pub use crate::memory::MemoryEngine;
    pub use crate::model::ModelRef;
    pub use crate::query::{FindQuery, WithEntry};
    pub use crate::record::{FetchResult, Record};
    pub use crate::relations::{RelationConfig, RelationKind, Scope};
    pub use crate::repository::Repository;
    pub use crate::traits::QueryEngine;
    pub use crate::types::{OrderByField, SortOrder};
}
