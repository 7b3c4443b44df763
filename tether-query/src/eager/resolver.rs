//! Post-fetch stage resolving alternate relations in batches.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::config::DebugConfig;
use crate::connection::EngineRouter;
use crate::error::QueryResult;
use crate::middleware::{FetchContext, Middleware, MiddlewareResult, Next};
use crate::model::ModelRef;
use crate::query::WithEntry;
use crate::record::{FetchResult, Record};
use crate::relations::RegistryHandle;
use crate::traits::{BoxFuture, ModelLocator};

use super::batch::{BatchResult, SearchPlan, batch_query, dedup_by_group, shape};

/// Attaches alternate relations to fetched records.
///
/// For each entry of `alternate_with`, one query fetches the related records
/// of every parent at once. Rows are grouped by foreign key and matched back
/// onto each parent's `field_name`. Parents without a key, or without
/// matches, get the relation's empty value (`null` or an empty collection).
///
/// Unregistered relation names and targets that cannot be located are
/// skipped. Suboptions that do not merge into valid options are ignored.
/// Errors from the batch query propagate unchanged.
pub struct BatchResolver {
    engines: Arc<EngineRouter>,
    locator: Arc<dyn ModelLocator>,
    debug: DebugConfig,
}

impl BatchResolver {
    /// Stage name in the fetch pipeline.
    pub const STAGE: &'static str = "relations.resolve";

    /// Create a resolver.
    pub fn new(
        engines: Arc<EngineRouter>,
        locator: Arc<dyn ModelLocator>,
        debug: DebugConfig,
    ) -> Self {
        Self {
            engines,
            locator,
            debug,
        }
    }

    /// Resolve every entry of `entries` onto `result`, in order.
    pub async fn resolve(
        &self,
        model: &ModelRef,
        registry: &RegistryHandle,
        entries: &[WithEntry],
        result: &mut FetchResult,
    ) -> QueryResult<()> {
        for entry in entries {
            self.resolve_entry(model, registry, entry, result.records_mut())
                .await?;
        }
        Ok(())
    }

    async fn resolve_entry(
        &self,
        model: &ModelRef,
        registry: &RegistryHandle,
        entry: &WithEntry,
        records: &mut [Record],
    ) -> QueryResult<()> {
        let name = entry.relation_name();
        let registered = registry.read().alternate(name).cloned();
        let Some(descriptor) = registered else {
            debug!(
                model = %model.name,
                relation = %name,
                "Relation not registered as alternate, skipping"
            );
            return Ok(());
        };

        let descriptor = match entry.suboptions().map(|patch| descriptor.merged(patch)) {
            Some(Ok(merged)) => merged,
            Some(Err(err)) => {
                warn!(
                    model = %model.name,
                    relation = %name,
                    error = %err,
                    "Ignoring invalid suboptions"
                );
                descriptor
            }
            None => descriptor,
        };

        let (Some(local_key), Some(foreign_key)) =
            (descriptor.local_key(), descriptor.foreign_key())
        else {
            warn!(model = %model.name, relation = %name, "Relation has no key mapping, skipping");
            return Ok(());
        };

        let Some(target) = self.locator.locate(&descriptor.to.name) else {
            warn!(
                model = %model.name,
                relation = %name,
                target = %descriptor.to.name,
                "Relation target cannot be located, skipping"
            );
            return Ok(());
        };

        let engine = self.engines.route(&target)?;
        let plan = SearchPlan::collect(records, local_key, |values| match engine.coercer() {
            Some(coercer) => coercer.coerce(&target, foreign_key, values),
            None => values,
        });

        let batch = if plan.is_empty() {
            debug!(model = %model.name, relation = %name, "No parent keys, skipping batch query");
            BatchResult::default()
        } else {
            let search_size = plan.values.len();
            let (query, strip) = batch_query(&descriptor, foreign_key, plan.values.clone());

            let started = Instant::now();
            let rows = engine.find(&target, query).await?.into_records();
            let elapsed_ms = started.elapsed().as_millis() as u64;

            if elapsed_ms >= self.debug.slow_batch_threshold {
                warn!(
                    relation = %name,
                    target = %target.name,
                    elapsed_ms,
                    threshold_ms = self.debug.slow_batch_threshold,
                    "Slow batch query"
                );
            }
            if self.debug.log_batches {
                info!(
                    relation = %name,
                    target = %target.name,
                    keys = search_size,
                    rows = rows.len(),
                    elapsed_ms,
                    "Batch query"
                );
            } else {
                debug!(
                    relation = %name,
                    target = %target.name,
                    keys = search_size,
                    rows = rows.len(),
                    "Batch query"
                );
            }

            BatchResult::group(rows, foreign_key, strip)
        };

        let group = descriptor.options.group.as_deref().unwrap_or_default();
        for (record, values) in records.iter_mut().zip(plan.per_parent) {
            let matched = values.map(|v| batch.matches(&v)).unwrap_or_default();
            let matched = dedup_by_group(matched, group);
            trace!(relation = %name, matched = matched.len(), "Attaching related records");
            record.insert(
                descriptor.field_name.clone(),
                shape(descriptor.cardinality(), matched, engine.as_ref(), &target),
            );
        }

        Ok(())
    }
}

impl Middleware for BatchResolver {
    fn handle<'a>(
        &'a self,
        ctx: FetchContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult<FetchResult>> {
        Box::pin(async move {
            if !ctx.has_alternate() {
                return next.run(ctx).await;
            }

            let model = ctx.model.clone();
            let registry = ctx.registry.clone();
            let entries = ctx.query.alternate_with.clone();

            let mut result = next.run(ctx).await?;
            self.resolve(&model, &registry, &entries, &mut result).await?;
            Ok(result)
        })
    }

    fn name(&self) -> &'static str {
        Self::STAGE
    }
}

impl std::fmt::Debug for BatchResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchResolver")
            .field("engines", &self.engines)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
