//! Fetch context passed through the pipeline.

use std::time::{Duration, Instant};

use crate::model::ModelRef;
use crate::query::FindQuery;
use crate::relations::RegistryHandle;

/// Everything a stage needs to handle one fetch.
///
/// The registry travels with the request so stages never reach for
/// global state.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Model being fetched.
    pub model: ModelRef,
    /// Relation registry of that model.
    pub registry: RegistryHandle,
    /// The query, as rewritten by earlier stages.
    pub query: FindQuery,
    started_at: Instant,
}

impl FetchContext {
    /// Create a context for a fetch.
    pub fn new(model: ModelRef, registry: RegistryHandle, query: FindQuery) -> Self {
        Self {
            model,
            registry,
            query,
            started_at: Instant::now(),
        }
    }

    /// Replace the query.
    pub fn with_query(mut self, query: FindQuery) -> Self {
        self.query = query;
        self
    }

    /// Time since the fetch started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether the query requests any relation resolved by the batch resolver.
    pub fn has_alternate(&self) -> bool {
        !self.query.alternate_with.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::WithEntry;
    use crate::relations::RelationRegistry;

    #[test]
    fn test_has_alternate() {
        let ctx = FetchContext::new(
            ModelRef::new("Post"),
            RelationRegistry::shared(),
            FindQuery::all().with("Comments"),
        );
        assert!(!ctx.has_alternate());

        let mut query = ctx.query.clone();
        query.alternate_with.push(WithEntry::name("Tags"));
        let ctx = ctx.with_query(query);
        assert!(ctx.has_alternate());
    }
}
