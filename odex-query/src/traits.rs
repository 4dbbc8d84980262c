//! The seams between the resolution core and the transport.
//!
//! [`Transport`] is the single remote primitive the client needs: run one named
//! method on one collection. [`RecordFetcher`] is the narrower read primitive
//! the relation loader consumes; every transport gets it for free through the
//! service's `read` method.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::error::{QueryError, QueryResult};
use crate::record::{RawRecord, RecordId};
use crate::value::{CallArgs, Value};

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Classification of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The targeted records do not exist.
    Missing,
    /// The server refused the operation on business grounds (validation,
    /// integrity constraints).
    UserError,
    /// The user lacks access rights on the records.
    AccessError,
    /// Credentials were rejected.
    AccessDenied,
    /// Any other server-side exception.
    Application,
    /// The service could not be reached.
    Connection,
    /// The request timed out.
    Timeout,
    /// The response did not follow the wire protocol.
    Protocol,
}

impl FaultKind {
    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::UserError => "user error",
            Self::AccessError => "access error",
            Self::AccessDenied => "access denied",
            Self::Application => "application error",
            Self::Connection => "connection error",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol error",
        }
    }
}

/// A failure reported by the transport.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} fault: {message}", .kind.as_str())]
pub struct RemoteFault {
    /// What went wrong.
    pub kind: FaultKind,
    /// Numeric fault code, when the service sent one.
    pub code: Option<i64>,
    /// Human-readable message.
    pub message: String,
    /// Server-side exception class or traceback, when available.
    pub detail: Option<String>,
}

impl RemoteFault {
    /// Create a fault.
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            detail: None,
        }
    }

    /// Set the numeric fault code.
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Check if the fault reports missing records.
    pub fn is_missing(&self) -> bool {
        self.kind == FaultKind::Missing
    }
}

/// Executes one named remote operation against one collection.
///
/// Implementations own authentication and the wire protocol; timeouts and
/// connection problems surface as a [`RemoteFault`].
pub trait Transport: Send + Sync {
    /// Invoke `method` on `collection` with positional and keyword arguments.
    fn invoke<'a>(
        &'a self,
        collection: &'a str,
        method: &'a str,
        args: CallArgs,
    ) -> BoxFuture<'a, Result<Value, RemoteFault>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn invoke<'a>(
        &'a self,
        collection: &'a str,
        method: &'a str,
        args: CallArgs,
    ) -> BoxFuture<'a, Result<Value, RemoteFault>> {
        (**self).invoke(collection, method, args)
    }
}

/// Reads a set of records of one collection with the given fields.
pub trait RecordFetcher: Send + Sync {
    /// Fetch `ids` from `collection`, returning one raw record per existing id.
    fn fetch<'a>(
        &'a self,
        collection: &'a str,
        ids: &'a [RecordId],
        fields: &'a [String],
    ) -> BoxFuture<'a, QueryResult<Vec<RawRecord>>>;
}

impl<T: Transport + ?Sized> RecordFetcher for T {
    fn fetch<'a>(
        &'a self,
        collection: &'a str,
        ids: &'a [RecordId],
        fields: &'a [String],
    ) -> BoxFuture<'a, QueryResult<Vec<RawRecord>>> {
        Box::pin(async move {
            let args = CallArgs::new().arg(ids).kwarg("fields", fields.to_vec());
            let response = self.invoke(collection, "read", args).await.map_err(|fault| {
                QueryError::remote_operation(collection, "read", &fault)
                    .with_ids(ids.iter().copied())
                    .with_source(fault)
            })?;
            raw_records(response)
        })
    }
}

/// Decode a list-of-maps response into raw records.
pub fn raw_records(response: Value) -> QueryResult<Vec<RawRecord>> {
    match response {
        Value::List(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Map(map) => Ok(map),
                other => Err(QueryError::deserialization(format!(
                    "expected a record map, got {}",
                    other.kind()
                ))),
            })
            .collect(),
        other => Err(QueryError::deserialization(format!(
            "expected a list of records, got {}",
            other.kind()
        ))),
    }
}
