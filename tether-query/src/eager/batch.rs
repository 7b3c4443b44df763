//! Key collection, batch query construction, and result grouping.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;

use crate::filter::{Filter, FilterValue};
use crate::model::ModelRef;
use crate::query::FindQuery;
use crate::record::Record;
use crate::relations::{Cardinality, RelationDescriptor};
use crate::traits::QueryEngine;

/// Normalize a parent's local key field into the values to search for.
///
/// Missing, `null`, empty string, empty list and `false` mean "no key".
/// A list expands to its non-null elements; anything else is one value.
pub fn key_values(value: Option<&Value>) -> Option<Vec<FilterValue>> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let values: Vec<FilterValue> = items
                .iter()
                .filter(|v| !v.is_null())
                .map(FilterValue::from_json)
                .collect();
            (!values.is_empty()).then_some(values)
        }
        other => Some(vec![FilterValue::from_json(other)]),
    }
}

/// Per-parent key sets and their de-duplicated union.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPlan {
    /// Key values per parent, `None` when the parent has no usable key.
    pub per_parent: Vec<Option<Vec<FilterValue>>>,
    /// Union of all parent values in first-seen order.
    pub values: Vec<FilterValue>,
}

impl SearchPlan {
    /// Collect the values of `local_key` across `records`, passing each
    /// parent's set through `coerce`.
    pub fn collect<F>(records: &[Record], local_key: &str, mut coerce: F) -> Self
    where
        F: FnMut(Vec<FilterValue>) -> Vec<FilterValue>,
    {
        let mut union: IndexMap<String, FilterValue> = IndexMap::new();
        let per_parent = records
            .iter()
            .map(|record| {
                let values = coerce(key_values(record.get(local_key))?);
                for value in &values {
                    union
                        .entry(value.bucket_key())
                        .or_insert_with(|| value.clone());
                }
                Some(values)
            })
            .collect();

        Self {
            per_parent,
            values: union.into_values().collect(),
        }
    }

    /// Whether no parent has a usable key.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build the single query fetching every related record for `values`.
///
/// Returns the query and whether `foreign_key` was added to the projection
/// only for grouping (and so must be stripped from the rows).
pub fn batch_query(
    descriptor: &RelationDescriptor,
    foreign_key: &str,
    values: Vec<FilterValue>,
) -> (FindQuery, bool) {
    let options = &descriptor.options;
    let conditions = options
        .filter()
        .and_then(Filter::In(foreign_key.to_string(), values));

    let mut strip = false;
    let fields = options.fields.clone().map(|mut fields| {
        if !fields.iter().any(|f| f == foreign_key) {
            fields.push(foreign_key.to_string());
            strip = true;
        }
        fields
    });

    let query = FindQuery {
        conditions,
        fields,
        group: options.group.clone(),
        order: options.order.clone(),
        limit: options.limit,
        ..FindQuery::all()
    };
    (query, strip)
}

/// Related records grouped by foreign key value, in query return order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    buckets: IndexMap<String, Vec<Record>>,
}

impl BatchResult {
    /// Group `rows` by `foreign_key`.
    ///
    /// A row whose key is a list lands in the bucket of every element. Rows
    /// without a key are dropped. With `strip`, the key field is removed from
    /// each row after grouping.
    pub fn group(rows: Vec<Record>, foreign_key: &str, strip: bool) -> Self {
        let mut buckets: IndexMap<String, Vec<Record>> = IndexMap::new();

        for mut row in rows {
            let keys = match row.get(foreign_key) {
                Some(Value::Array(items)) => {
                    let mut seen = HashSet::new();
                    items
                        .iter()
                        .filter(|v| !v.is_null())
                        .map(|v| FilterValue::from_json(v).bucket_key())
                        .filter(|k| seen.insert(k.clone()))
                        .collect()
                }
                Some(Value::Null) | None => Vec::new(),
                Some(value) => vec![FilterValue::from_json(value).bucket_key()],
            };

            if strip {
                row.remove(foreign_key);
            }

            if let Some((last, rest)) = keys.split_last() {
                for key in rest {
                    buckets.entry(key.clone()).or_default().push(row.clone());
                }
                buckets.entry(last.clone()).or_default().push(row);
            }
        }

        Self { buckets }
    }

    /// Number of distinct key values.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no row was grouped.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Rows grouped under `value`.
    pub fn bucket(&self, value: &FilterValue) -> Option<&[Record]> {
        self.buckets.get(&value.bucket_key()).map(Vec::as_slice)
    }

    /// Concatenate the buckets matching any of `values`.
    ///
    /// Buckets are taken in the order the grouped map holds them, which is
    /// the order the query returned their first row, not the order of `values`.
    pub fn matches(&self, values: &[FilterValue]) -> Vec<Record> {
        let mut indices: Vec<usize> = values
            .iter()
            .filter_map(|v| self.buckets.get_index_of(&v.bucket_key()))
            .collect();
        indices.sort_unstable();
        indices.dedup();

        indices
            .into_iter()
            .filter_map(|i| self.buckets.get_index(i))
            .flat_map(|(_, rows)| rows.iter().cloned())
            .collect()
    }
}

/// Keep the first record of each distinct `group` value tuple.
pub fn dedup_by_group(records: Vec<Record>, group: &[String]) -> Vec<Record> {
    if group.is_empty() {
        return records;
    }

    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let tuple: Vec<Value> = group
                .iter()
                .map(|field| record.get(field).cloned().unwrap_or(Value::Null))
                .collect();
            seen.insert(Value::Array(tuple).to_string())
        })
        .collect()
}

/// Shape matched records for attachment.
///
/// To-one takes the first record or `null`; to-many becomes the engine's
/// native collection.
pub fn shape(
    cardinality: Cardinality,
    records: Vec<Record>,
    engine: &dyn QueryEngine,
    target: &ModelRef,
) -> Value {
    match cardinality {
        Cardinality::ToOne => records
            .into_iter()
            .next()
            .map_or(Value::Null, Value::Object),
        Cardinality::ToMany => engine.collection(target, records),
    }
}
