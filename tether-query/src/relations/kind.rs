//! Relation kinds and their cardinality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// How many related records a relation attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// At most one record (`null` when there is none).
    ToOne,
    /// A collection of records (empty when there are none).
    ToMany,
}

/// Relation kinds in the data mapper's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// The target holds a key pointing at this model; one record.
    HasOne,
    /// This model holds a key pointing at the target.
    BelongsTo,
    /// The target holds a key pointing at this model; many records.
    HasMany,
}

impl RelationKind {
    /// All kinds, in declaration order.
    pub const ALL: [RelationKind; 3] = [Self::HasOne, Self::BelongsTo, Self::HasMany];

    /// The kind's name as used in declarations (`hasMany`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasOne => "hasOne",
            Self::BelongsTo => "belongsTo",
            Self::HasMany => "hasMany",
        }
    }

    /// Cardinality of the attached value.
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::HasOne | Self::BelongsTo => Cardinality::ToOne,
            Self::HasMany => Cardinality::ToMany,
        }
    }

    /// Whether the key lives on the target model.
    pub fn key_on_target(&self) -> bool {
        matches!(self, Self::HasOne | Self::HasMany)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| QueryError::unknown_relation_kind(s))
    }
}
