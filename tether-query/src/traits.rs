//! Capabilities consumed from the host data mapper.
//!
//! Tether owns no storage connection and no query language. Everything it
//! needs from the host goes through these traits:
//!
//! - [`QueryEngine`] executes a single `find` and builds native collections
//! - [`ModelLocator`] resolves a model name to its identity
//! - [`ValueCoercer`] (optional, exposed by an engine) normalises key values
//! - [`NativeBinder`] performs the host's own relation binding
//! - [`Inflector`] derives field names from relation names

use serde_json::Value;

pub use futures::future::BoxFuture;

use crate::error::QueryResult;
use crate::filter::FilterValue;
use crate::model::ModelRef;
use crate::query::FindQuery;
use crate::record::{FetchResult, Record};
use crate::relations::{RelationConfig, RelationDescriptor, RelationKind};

/// Executes queries against one storage backend.
///
/// Timeouts, retries, and cancellation belong to the engine; whatever it
/// returns or fails with is propagated unchanged.
pub trait QueryEngine: Send + Sync {
    /// Execute a find for `model`.
    fn find<'a>(
        &'a self,
        model: &'a ModelRef,
        query: FindQuery,
    ) -> BoxFuture<'a, QueryResult<FetchResult>>;

    /// Value coercion applied by this backend on write, if any.
    fn coercer(&self) -> Option<&dyn ValueCoercer> {
        None
    }

    /// Wrap related records in the backend's native collection representation.
    fn collection(&self, _model: &ModelRef, records: Vec<Record>) -> Value {
        Value::Array(records.into_iter().map(Value::Object).collect())
    }
}

/// Coerces key values into the representation a backend stores.
pub trait ValueCoercer: Send + Sync {
    /// Coerce the values searched for in `field` of `model`.
    fn coerce(&self, model: &ModelRef, field: &str, values: Vec<FilterValue>) -> Vec<FilterValue>;
}

/// Resolves model names to model identities.
pub trait ModelLocator: Send + Sync {
    /// Locate a model by name.
    fn locate(&self, name: &str) -> Option<ModelRef>;
}

/// The host's native relation binding.
pub trait NativeBinder: Send + Sync {
    /// Bind a relation natively, returning the host's description of it.
    fn bind(
        &self,
        from: &ModelRef,
        kind: RelationKind,
        name: &str,
        config: &RelationConfig,
    ) -> QueryResult<RelationDescriptor>;
}

/// Word inflection used to derive relation field names.
pub trait Inflector: Send + Sync {
    /// Plural form of `word`.
    fn pluralize(&self, word: &str) -> String;

    /// Singular form of `word`.
    fn singularize(&self, word: &str) -> String;

    /// Lower snake_case form of `word`.
    fn underscore(&self, word: &str) -> String;
}
