//! In-memory query engine.
//!
//! [`MemoryEngine`] stores records per model name and evaluates
//! [`FindQuery`] filters, ordering, limits and projections itself. It logs
//! every query it receives, which makes it the reference double for
//! asserting how many queries a fetch issued.
//!
//! ```rust
//! use serde_json::json;
//! use tether_query::memory::MemoryEngine;
//!
//! let engine = MemoryEngine::new()
//!     .with_json("Post", json!([{"id": 1, "title": "Hello"}]));
//! assert_eq!(engine.table_len("Post"), 1);
//! assert_eq!(engine.query_count(), 0);
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::trace;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::model::ModelRef;
use crate::query::{FindKind, FindQuery};
use crate::record::{FetchResult, Record, record_from_json};
use crate::traits::{BoxFuture, QueryEngine, ValueCoercer};
use crate::types::{OrderByField, SortOrder};

/// A query received by a [`MemoryEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedQuery {
    /// Model the query targeted.
    pub model: String,
    /// The query as received.
    pub query: FindQuery,
}

/// Query engine over in-memory tables.
#[derive(Default)]
pub struct MemoryEngine {
    tables: RwLock<IndexMap<String, Vec<Record>>>,
    log: Mutex<Vec<LoggedQuery>>,
    failing: RwLock<HashSet<String>>,
    coercer: Option<Arc<dyn ValueCoercer>>,
}

impl MemoryEngine {
    /// Create an engine with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records to a table (builder pattern).
    pub fn with_table(self, model: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert_many(model, records);
        self
    }

    /// Add records given as a JSON array of objects (builder pattern).
    pub fn with_json(self, model: impl Into<String>, records: Value) -> Self {
        let records = match records {
            Value::Array(items) => items.into_iter().map(record_from_json).collect(),
            other => vec![record_from_json(other)],
        };
        self.with_table(model, records)
    }

    /// Coerce search values with `coercer`.
    pub fn with_coercer(mut self, coercer: impl ValueCoercer + 'static) -> Self {
        self.coercer = Some(Arc::new(coercer));
        self
    }

    /// Append a record to a table.
    pub fn insert(&self, model: impl Into<String>, record: Record) {
        self.tables.write().entry(model.into()).or_default().push(record);
    }

    /// Append records to a table.
    pub fn insert_many(&self, model: impl Into<String>, records: Vec<Record>) {
        self.tables
            .write()
            .entry(model.into())
            .or_default()
            .extend(records);
    }

    /// Number of records stored for `model`.
    pub fn table_len(&self, model: &str) -> usize {
        self.tables.read().get(model).map_or(0, Vec::len)
    }

    /// Make every query against `model` fail with a database error.
    pub fn fail_queries_on(&self, model: impl Into<String>) {
        self.failing.write().insert(model.into());
    }

    /// Stop injecting failures for `model`.
    pub fn heal(&self, model: &str) {
        self.failing.write().remove(model);
    }

    /// Number of queries received.
    pub fn query_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Every query received, in order.
    pub fn queries(&self) -> Vec<LoggedQuery> {
        self.log.lock().clone()
    }

    /// Queries received for `model`, in order.
    pub fn queries_for(&self, model: &str) -> Vec<FindQuery> {
        self.log
            .lock()
            .iter()
            .filter(|q| q.model == model)
            .map(|q| q.query.clone())
            .collect()
    }

    /// Forget logged queries.
    pub fn clear_log(&self) {
        self.log.lock().clear();
    }

    fn select(&self, model: &str, query: &FindQuery) -> Vec<Record> {
        let tables = self.tables.read();
        let mut rows: Vec<Record> = tables
            .get(model)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.conditions.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if !query.order.is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, &query.order));
        }

        let limit = match query.kind {
            FindKind::First => Some(1),
            FindKind::All => query.limit.map(|n| n as usize),
        };
        if let Some(limit) = limit {
            rows.truncate(limit);
        }

        if let Some(fields) = &query.fields {
            for row in &mut rows {
                row.retain(|field, _| fields.iter().any(|f| f == field));
            }
        }

        rows
    }
}

fn compare_rows(a: &Record, b: &Record, order: &[OrderByField]) -> Ordering {
    order
        .iter()
        .map(|o| {
            let left = a.get(&o.field).map(FilterValue::from_json);
            let right = b.get(&o.field).map(FilterValue::from_json);
            let ord = match (left, right) {
                (Some(l), Some(r)) => l.compare(&r).unwrap_or(Ordering::Equal),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match o.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl QueryEngine for MemoryEngine {
    fn find<'a>(
        &'a self,
        model: &'a ModelRef,
        query: FindQuery,
    ) -> BoxFuture<'a, QueryResult<FetchResult>> {
        Box::pin(async move {
            self.log.lock().push(LoggedQuery {
                model: model.name.clone(),
                query: query.clone(),
            });

            if self.failing.read().contains(&model.name) {
                return Err(QueryError::database(format!(
                    "injected failure for {}",
                    model.name
                )));
            }

            let rows = self.select(&model.name, &query);
            trace!(model = %model.name, rows = rows.len(), "Memory find");

            Ok(match query.kind {
                FindKind::First => rows
                    .into_iter()
                    .next()
                    .map_or(FetchResult::Empty, FetchResult::Single),
                FindKind::All => FetchResult::Collection(rows),
            })
        })
    }

    fn coercer(&self) -> Option<&dyn ValueCoercer> {
        self.coercer.as_deref()
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("tables", &self.tables.read().keys().collect::<Vec<_>>())
            .field("queries", &self.query_count())
            .finish_non_exhaustive()
    }
}
