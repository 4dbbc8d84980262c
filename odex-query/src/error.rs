//! Error types for resolution and collection operations.
//!
//! Every failure surfaced by the client is a [`QueryError`]: an [`ErrorCode`]
//! for programmatic handling, a message, and an [`ErrorContext`] describing the
//! collection, field and identifiers involved.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: O{category}{number}
//! - 1xxx: Field specification errors (raised before any remote call)
//! - 2xxx: Remote operation errors (base fetch, relation fetch, plain calls)
//! - 3xxx: Connection and session errors
//! - 6xxx: Data errors (unexpected wire shapes)
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use odex_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::invalid_field_spec("partner_id", "sub-field list is empty");
//! assert_eq!(err.code, ErrorCode::InvalidFieldSpec);
//! assert!(err.is_specification_error());
//! assert_eq!(err.code.code(), "O1001");
//! ```

use std::fmt;

use thiserror::Error;

use crate::record::RecordId;
use crate::traits::RemoteFault;

/// Result type for odex operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Specification errors (1xxx)
    /// Malformed field or relation descriptor (O1001).
    InvalidFieldSpec = 1001,

    // Remote errors (2xxx)
    /// A remote operation against a collection failed (O2001).
    RemoteOperation = 2001,
    /// A batched relation fetch failed (O2002).
    RelationFetch = 2002,

    // Connection errors (3xxx)
    /// The service could not be reached (O3001).
    ConnectionFailed = 3001,
    /// The request timed out (O3002).
    ConnectionTimeout = 3002,
    /// Login rejected (O3003).
    AuthenticationFailed = 3003,
    /// The configured database does not exist (O3004).
    DatabaseNotFound = 3004,

    // Data errors (6xxx)
    /// A response value had an unexpected shape (O6001).
    Deserialization = 6001,

    // Configuration errors (7xxx)
    /// Invalid configuration value (O7001).
    InvalidConfiguration = 7001,
    /// Missing configuration value (O7002).
    MissingConfiguration = 7002,

    // Internal errors (9xxx)
    /// Internal error (O9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "O2002").
    pub fn code(&self) -> String {
        format!("O{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidFieldSpec => "Invalid field specification",
            Self::RemoteOperation => "Remote operation failed",
            Self::RelationFetch => "Relation fetch failed",
            Self::ConnectionFailed => "Connection failed",
            Self::ConnectionTimeout => "Connection timeout",
            Self::AuthenticationFailed => "Authentication failed",
            Self::DatabaseNotFound => "Database not found",
            Self::Deserialization => "Unexpected response value",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::MissingConfiguration => "Missing configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The remote operation that was being performed.
    pub operation: Option<String>,
    /// The collection involved.
    pub collection: Option<String>,
    /// The local relation field involved.
    pub field: Option<String>,
    /// The target collection of a relation fetch.
    pub target_collection: Option<String>,
    /// Identifiers the failing request covered.
    pub ids: Vec<RecordId>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

/// Errors that can occur while talking to the service.
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

    /// Set the operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the collection.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.context.collection = Some(collection.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the identifiers involved.
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.context.ids = ids.into_iter().collect();
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a malformed field specification error.
    pub fn invalid_field_spec(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidFieldSpec,
            format!("Invalid field specification `{}`: {}", field, message),
        )
        .with_field(&field)
        .with_suggestion("Relations need a local field, a target collection and at least one sub-field")
    }

    /// Create an error for a failed remote operation.
    pub fn remote_operation(
        collection: impl Into<String>,
        operation: impl Into<String>,
        fault: impl fmt::Display,
    ) -> Self {
        let collection = collection.into();
        let operation = operation.into();
        Self::new(
            ErrorCode::RemoteOperation,
            format!("{} on {} failed: {}", operation, collection, fault),
        )
        .with_collection(&collection)
        .with_operation(&operation)
    }

    /// Wrap an error raised while fetching a relation's records.
    pub fn relation_fetch(
        field: impl Into<String>,
        target_collection: impl Into<String>,
        cause: QueryError,
    ) -> Self {
        let field = field.into();
        let target = target_collection.into();
        let mut err = Self::new(
            ErrorCode::RelationFetch,
            format!("Fetching relation `{}` from {} failed: {}", field, target, cause.message),
        )
        .with_field(&field)
        .with_source(cause);
        err.context.target_collection = Some(target);
        err
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Connection error: {}", message.into()),
        )
        .with_suggestion("Check that the service is running and the URL and port are correct")
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::ConnectionTimeout,
            format!("Request timed out after {}ms", duration_ms),
        )
        .with_suggestion("Increase the request timeout in the client configuration")
    }

    /// Create an authentication error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AuthenticationFailed,
            format!("Authentication failed: {}", message.into()),
        )
        .with_suggestion("Check the username and password")
    }

    /// Create a database not found error.
    pub fn database_not_found(database: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DatabaseNotFound,
            format!("Database not found: {}", database.into()),
        )
    }

    /// Create an error for a response value with an unexpected shape.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::Deserialization,
            format!("Unexpected response value: {}", message.into()),
        )
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into())
    }

    /// Create a missing configuration error.
    pub fn missing_configuration(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::MissingConfiguration,
            format!("Missing configuration value: {}", key),
        )
        .with_field(&key)
        .with_suggestion("Set the variable or build the configuration explicitly")
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Check if this error was raised by field specification validation.
    pub fn is_specification_error(&self) -> bool {
        self.code == ErrorCode::InvalidFieldSpec
    }

    /// Check if this error came from the remote service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::RemoteOperation | ErrorCode::RelationFetch
        )
    }

    /// Check if this error wraps a failed relation fetch.
    pub fn is_relation_fetch(&self) -> bool {
        self.code == ErrorCode::RelationFetch
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::ConnectionTimeout
    }

    /// Check if this is a connection or session error.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConnectionFailed
                | ErrorCode::ConnectionTimeout
                | ErrorCode::AuthenticationFailed
                | ErrorCode::DatabaseNotFound
        )
    }

    /// The wrapped error, if it is itself a `QueryError`.
    pub fn inner(&self) -> Option<&QueryError> {
        self.source.as_ref()?.downcast_ref::<QueryError>()
    }

    /// The fault the service answered with, if this error carries one.
    pub fn remote_fault(&self) -> Option<&RemoteFault> {
        self.source.as_ref()?.downcast_ref::<RemoteFault>()
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref collection) = self.context.collection {
            output.push_str(&format!("  → Collection: {}\n", collection));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref target) = self.context.target_collection {
            output.push_str(&format!("  → Target: {}\n", target));
        }
        if !self.context.ids.is_empty() {
            let ids: Vec<_> = self.context.ids.iter().map(ToString::to_string).collect();
            output.push_str(&format!("  → Ids: [{}]\n", ids.join(", ")));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        let mut cause = self.inner();
        while let Some(err) = cause {
            output.push_str(&format!("\nCaused by: [{}] {}", err.code.code(), err.message));
            cause = err.inner();
        }

        output
    }
}
