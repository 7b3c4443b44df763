//! Pre-fetch stage splitting requested relations.

use tracing::debug;

use crate::middleware::{FetchContext, Middleware, MiddlewareResult, Next};
use crate::query::{FindQuery, WithEntry};
use crate::record::FetchResult;
use crate::relations::RelationRegistry;
use crate::traits::BoxFuture;

/// Moves requested relations that are registered as alternate from `with`
/// into `alternate_with`.
///
/// Entries keep their shape (bare name or name with suboptions) and their
/// relative order in both lists. Unknown names stay in `with` for the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithTranslator;

impl WithTranslator {
    /// Stage name in the fetch pipeline.
    pub const STAGE: &'static str = "relations.translate";

    /// Create a translator.
    pub fn new() -> Self {
        Self
    }

    /// Split `query.with` against `registry`.
    pub fn translate(&self, registry: &RelationRegistry, query: &mut FindQuery) {
        if query.with.is_empty() {
            return;
        }

        let (alternate, native): (Vec<WithEntry>, Vec<WithEntry>) = std::mem::take(&mut query.with)
            .into_iter()
            .partition(|entry| registry.alternate(entry.relation_name()).is_some());

        query.with = native;
        query.alternate_with.extend(alternate);
    }
}

impl Middleware for WithTranslator {
    fn handle<'a>(
        &'a self,
        mut ctx: FetchContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult<FetchResult>> {
        {
            let registry = ctx.registry.read();
            self.translate(&registry, &mut ctx.query);
        }

        if ctx.has_alternate() {
            debug!(
                model = %ctx.model.name,
                native = ctx.query.with.len(),
                alternate = ctx.query.alternate_with.len(),
                "Split requested relations"
            );
        }

        next.run(ctx)
    }

    fn name(&self) -> &'static str {
        Self::STAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelRef;
    use crate::relations::{RelationDescriptor, RelationKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> RelationRegistry {
        let mut registry = RelationRegistry::new();
        for (name, native) in [("Comments", false), ("Tags", false), ("Author", true)] {
            let descriptor = RelationDescriptor::new(
                RelationKind::HasMany,
                name,
                ModelRef::new("Post"),
                ModelRef::new(name),
                "id",
                "post_id",
                name.to_lowercase(),
            );
            registry.insert(if native { descriptor.native() } else { descriptor });
        }
        registry
    }

    #[test]
    fn test_translate_splits_preserving_order_and_shape() {
        let mut query = FindQuery::all()
            .with("Author")
            .with(WithEntry::nested("Tags", json!({"limit": 2})))
            .with("Unknown")
            .with("Comments");

        WithTranslator::new().translate(&registry(), &mut query);

        assert_eq!(query.with, vec![WithEntry::name("Author"), WithEntry::name("Unknown")]);
        assert_eq!(
            query.alternate_with,
            vec![
                WithEntry::nested("Tags", json!({"limit": 2})),
                WithEntry::name("Comments"),
            ]
        );
    }

    #[test]
    fn test_translate_without_alternate_matches() {
        let mut query = FindQuery::all().with("Author");
        WithTranslator::new().translate(&registry(), &mut query);

        assert_eq!(query.with, vec![WithEntry::name("Author")]);
        assert!(query.alternate_with.is_empty());
    }

    #[tokio::test]
    async fn test_stage_passes_translated_query() {
        let handle = std::sync::Arc::new(parking_lot::RwLock::new(registry()));
        let ctx = FetchContext::new(
            ModelRef::new("Post"),
            handle,
            FindQuery::all().with_many(["Comments", "Author"]),
        );

        let translator = WithTranslator::new();
        let next = Next::new(|ctx| {
            Box::pin(async move {
                assert_eq!(ctx.query.with, vec![WithEntry::name("Author")]);
                assert_eq!(ctx.query.alternate_with, vec![WithEntry::name("Comments")]);
                Ok(FetchResult::Empty)
            })
        });

        let result = translator.handle(ctx, next).await.unwrap();
        assert_eq!(result, FetchResult::Empty);
    }
}
