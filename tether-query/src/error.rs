//! Error types for relation binding and fetch operations.
//!
//! Errors carry a numeric code, a message, and optional context with
//! actionable suggestions.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: T{category}{number}
//! - 1xxx: Relation errors (unknown kind, invalid options, unregistered name)
//! - 3xxx: Connection errors (failed, timeout)
//! - 5xxx: Execution errors (timeout, database)
//! - 6xxx: Data errors (serialization)
//! - 7xxx: Configuration errors
//!
//! Only configuration mistakes and genuine backend failures are errors. A
//! relation target that cannot be located, an unregistered name in
//! `alternate_with`, or a result set without usable keys all degrade to an
//! empty relation instead.
//!
//! ```rust
//! use tether_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::unknown_relation_kind("hasSome");
//! assert_eq!(err.code, ErrorCode::UnknownRelationKind);
//! assert!(err.to_string().contains("hasSome"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Relation errors (1xxx)
    /// Relation type name is not one of hasOne/belongsTo/hasMany (T1010).
    UnknownRelationKind = 1010,
    /// Relation options could not be merged or decoded (T1011).
    InvalidRelationOptions = 1011,
    /// Relation name is not registered on the model (T1012).
    RelationNotFound = 1012,

    // Connection errors (3xxx)
    /// Database connection failed (T3001).
    ConnectionFailed = 3001,
    /// Connection timeout (T3003).
    ConnectionTimeout = 3003,

    // Query execution errors (5xxx)
    /// Query timeout (T5001).
    QueryTimeout = 5001,
    /// General database error (T5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Serialization error (T6002).
    SerializationError = 6002,

    // Configuration errors (7xxx)
    /// Invalid configuration (T7001).
    InvalidConfiguration = 7001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "T1010").
    pub fn code(&self) -> String {
        format!("T{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownRelationKind => "Unknown relation kind",
            Self::InvalidRelationOptions => "Invalid relation options",
            Self::RelationNotFound => "Relation not found",
            Self::ConnectionFailed => "Database connection failed",
            Self::ConnectionTimeout => "Connection timeout",
            Self::QueryTimeout => "Query timeout",
            Self::DatabaseError => "Database error",
            Self::SerializationError => "Serialization error",
            Self::InvalidConfiguration => "Invalid configuration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The relation involved.
    pub relation: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur during relation and fetch operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(
        mut self,
        text: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the relation.
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.context.relation = Some(relation.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an unknown relation kind error.
    pub fn unknown_relation_kind(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::new(
            ErrorCode::UnknownRelationKind,
            format!("Unknown relation kind '{}'", kind),
        )
        .with_suggestion("Use one of hasOne, belongsTo or hasMany")
    }

    /// Create an invalid relation options error.
    pub fn invalid_options(relation: impl Into<String>, message: impl Into<String>) -> Self {
        let relation = relation.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidRelationOptions,
            format!("Invalid options for relation {}: {}", relation, message),
        )
        .with_relation(&relation)
        .with_code_suggestion(
            "Options are merged as JSON objects; keep the declared field types",
            r#"{"Comments": {"limit": 5, "conditions": {"published": true}}}"#,
        )
    }

    /// Create a relation not found error.
    pub fn relation_not_found(model: impl Into<String>, relation: impl Into<String>) -> Self {
        let model = model.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::RelationNotFound,
            format!("Relation {} is not registered on {}", relation, model),
        )
        .with_model(&model)
        .with_relation(&relation)
        .with_suggestion("Bind the relation before overriding or requesting it")
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Connection error: {}", message),
        )
        .with_suggestion("Check that the database server is running")
        .with_suggestion("Verify the connection URL is correct")
    }

    /// Create a connection timeout error.
    pub fn connection_timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::ConnectionTimeout,
            format!("Connection timed out after {}ms", duration_ms),
        )
        .with_suggestion("Check network connectivity to the database server")
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::QueryTimeout,
            format!("Query timed out after {}ms", duration_ms),
        )
        .with_suggestion("Add an index on the foreign key used for batching")
        .with_help("Batch queries select every related row for the whole result set")
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
            .with_suggestion("Check the database logs for more details")
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message.into())
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message),
        )
        .with_help("See tether.toml in the crate documentation for the accepted keys")
    }

    // ============== Error Checks ==============

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self.code, ErrorCode::QueryTimeout | ErrorCode::ConnectionTimeout)
    }

    /// Check if this error came from the storage backend rather than from
    /// relation configuration.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConnectionFailed
                | ErrorCode::ConnectionTimeout
                | ErrorCode::QueryTimeout
                | ErrorCode::DatabaseError
        )
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref relation) = self.context.relation {
            output.push_str(&format!("  → Relation: {}\n", relation));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!(
                        "     ```\n     {}\n     ```\n",
                        code.replace('\n', "\n     ")
                    ));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::serialization(err.to_string()).with_source(err)
    }
}
