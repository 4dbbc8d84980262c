//! Error types for the JSON-RPC transport.

use odex_query::{FaultKind, QueryError, RemoteFault};
use thiserror::Error;

/// Result type for transport operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors that can occur while talking to the service.
#[derive(Error, Debug)]
pub enum RpcError {
    /// HTTP client error not covered by a more specific variant.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required environment variable is not set.
    #[error("configuration error: {0} is not set")]
    MissingConfig(String),

    /// The server could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request did not complete in time.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// Login rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The configured database does not exist on the server.
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// The server answered with a fault.
    #[error(transparent)]
    Fault(RemoteFault),

    /// The server answered with something that is not a JSON-RPC response.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RpcError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Classify a failed HTTP exchange.
    pub fn from_http(err: reqwest::Error, endpoint: &str, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            return Self::Timeout(timeout_ms);
        }

        let chain = error_chain(&err);
        if chain.contains("wrong version number") {
            return Self::Connection(format!(
                "TLS handshake with {endpoint} failed (probably need http, are you using https?)"
            ));
        }
        if err.is_connect() {
            if chain.contains("dns error") || chain.contains("failed to lookup address") {
                return Self::Connection(format!("bad url: {endpoint}"));
            }
            return Self::Connection(format!("cannot reach {endpoint}: {chain}"));
        }
        if err.is_decode() {
            return Self::Protocol(format!(
                "unreadable response from {endpoint} (make sure you're using https on an https port): {chain}"
            ));
        }
        Self::Http(err)
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if the server rejected the credentials.
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// The server fault, if this is one.
    pub fn as_fault(&self) -> Option<&RemoteFault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

impl From<RpcError> for RemoteFault {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Fault(fault) => fault,
            RpcError::Timeout(ms) => {
                RemoteFault::new(FaultKind::Timeout, format!("request timed out after {ms}ms"))
            }
            RpcError::Connection(msg) => RemoteFault::new(FaultKind::Connection, msg),
            RpcError::Authentication(msg) => RemoteFault::new(FaultKind::AccessDenied, msg),
            RpcError::DatabaseNotFound(db) => {
                RemoteFault::new(FaultKind::Connection, format!("Database not found: {db}"))
            }
            RpcError::Http(e) => RemoteFault::new(FaultKind::Connection, e.to_string()),
            other => RemoteFault::new(FaultKind::Protocol, other.to_string()),
        }
    }
}

impl From<RpcError> for QueryError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Http(e) => QueryError::connection(e.to_string()),
            RpcError::Config(msg) => QueryError::invalid_configuration(msg),
            RpcError::MissingConfig(name) => QueryError::missing_configuration(name),
            RpcError::Connection(msg) => QueryError::connection(msg),
            RpcError::Timeout(ms) => QueryError::timeout(ms),
            RpcError::Authentication(msg) => QueryError::authentication_failed(msg),
            RpcError::DatabaseNotFound(db) => QueryError::database_not_found(db),
            RpcError::Fault(fault) => {
                QueryError::remote_operation("", "call", &fault).with_source(fault)
            }
            RpcError::Protocol(msg) => QueryError::deserialization(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RpcError::connection("connection refused");
        assert!(err.is_connection_error());

        let err = RpcError::Timeout(5000);
        assert!(err.is_timeout());

        let err = RpcError::Authentication("Wrong username or password!".into());
        assert!(err.is_authentication_error());
    }

    #[test]
    fn test_error_display() {
        let err = RpcError::config("database is required");
        assert_eq!(err.to_string(), "configuration error: database is required");

        let fault = RemoteFault::new(FaultKind::Missing, "Record does not exist");
        let err = RpcError::Fault(fault.clone());
        assert_eq!(err.to_string(), fault.to_string());
    }

    #[test]
    fn test_into_remote_fault() {
        let fault: RemoteFault = RpcError::Timeout(1000).into();
        assert_eq!(fault.kind, FaultKind::Timeout);

        let original = RemoteFault::new(FaultKind::UserError, "archive it instead").with_code(200);
        let fault: RemoteFault = RpcError::Fault(original.clone()).into();
        assert_eq!(fault, original);
    }

    #[test]
    fn test_into_query_error() {
        let err: QueryError = RpcError::Timeout(1000).into();
        assert!(err.is_timeout());

        let err: QueryError = RpcError::connection("refused").into();
        assert!(err.is_connection_error());

        let err: QueryError = RpcError::DatabaseNotFound("prod".into()).into();
        assert_eq!(err.code, odex_query::ErrorCode::DatabaseNotFound);
    }
}
