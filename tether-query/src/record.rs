//! Records returned by a fetch.

use serde_json::{Map, Value};

/// A single row: field name to JSON value.
pub type Record = Map<String, Value>;

/// The result of a fetch: one record, a collection, or nothing.
///
/// Post-fetch stages treat `Single` and `Collection` uniformly through
/// [`records_mut`](Self::records_mut).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchResult {
    /// A `find first` with no matching row.
    #[default]
    Empty,
    /// A single record.
    Single(Record),
    /// A homogeneous collection of records.
    Collection(Vec<Record>),
}

impl FetchResult {
    /// Number of records held.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Collection(records) => records.len(),
        }
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the records as a slice.
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Empty => &[],
            Self::Single(record) => std::slice::from_ref(record),
            Self::Collection(records) => records,
        }
    }

    /// Mutably borrow the records as a slice.
    pub fn records_mut(&mut self) -> &mut [Record] {
        match self {
            Self::Empty => &mut [],
            Self::Single(record) => std::slice::from_mut(record),
            Self::Collection(records) => records,
        }
    }

    /// The single record, if this is a `Single` result.
    pub fn into_single(self) -> Option<Record> {
        match self {
            Self::Single(record) => Some(record),
            _ => None,
        }
    }

    /// All records as a vector.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Empty => Vec::new(),
            Self::Single(record) => vec![record],
            Self::Collection(records) => records,
        }
    }
}

/// Build a record from a JSON object literal; non-objects yield an empty record.
pub fn record_from_json(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
