//! JSON-RPC wire envelope.
//!
//! Every call is a `POST` to `/jsonrpc` carrying
//! `{"jsonrpc": "2.0", "method": "call", "params": {"service", "method", "args"}, "id"}`.
//! Model methods go through the `object` service's `execute_kw`; login and
//! version checks through the `common` service.

use odex_query::{FaultKind, RemoteFault, Value};
use serde::{Deserialize, Serialize};

/// Service handling sessions and server information.
pub const SERVICE_COMMON: &str = "common";
/// Service handling model method calls.
pub const SERVICE_OBJECT: &str = "object";

/// Message substituted for the server's credential check failure.
pub const WRONG_CREDENTIALS: &str = "Wrong username or password!";

/// A JSON-RPC request.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
    id: u64,
}

#[derive(Debug, Clone, Serialize)]
struct RpcParams<'a> {
    service: &'a str,
    method: &'a str,
    args: Vec<Value>,
}

impl<'a> RpcRequest<'a> {
    /// Build a call of `method` on `service`.
    pub fn call(id: u64, service: &'a str, method: &'a str, args: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams {
                service,
                method,
                args,
            },
            id,
        }
    }
}

/// A JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    /// Echoed request id.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    /// Numeric code, `200` for server-side exceptions.
    #[serde(default)]
    pub code: i64,
    /// Generic message, e.g. "Odoo Server Error".
    #[serde(default)]
    pub message: String,
    /// Exception details.
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

/// Server-side exception details.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcErrorData {
    /// Fully qualified exception class, e.g. `odoo.exceptions.MissingError`.
    #[serde(default)]
    pub name: String,
    /// Exception message.
    #[serde(default)]
    pub message: String,
    /// Server traceback.
    #[serde(default)]
    pub debug: String,
}

impl RpcResponse {
    /// Split into the result value or the fault it carries.
    pub fn into_result(self) -> Result<Value, RemoteFault> {
        match self.error {
            Some(error) => Err(error.into_fault()),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

impl RpcErrorBody {
    /// Convert into a classified fault.
    pub fn into_fault(self) -> RemoteFault {
        let data = self.data.unwrap_or_default();
        let kind = classify(&data.name);

        let message = if data.message.is_empty() {
            self.message
        } else {
            data.message
        };

        let mut fault = RemoteFault::new(kind, message).with_code(self.code);
        if !data.name.is_empty() {
            fault = fault.with_detail(if data.debug.is_empty() {
                data.name
            } else {
                data.debug
            });
        }
        fault
    }
}

/// Map a server exception class to a fault kind.
pub fn classify(exception: &str) -> FaultKind {
    let class = exception.rsplit('.').next().unwrap_or(exception);
    match class {
        "MissingError" => FaultKind::Missing,
        "UserError" | "ValidationError" | "except_orm" | "IntegrityError" => FaultKind::UserError,
        "AccessError" => FaultKind::AccessError,
        "AccessDenied" => FaultKind::AccessDenied,
        _ => FaultKind::Application,
    }
}

/// Check whether a fault reports rejected credentials on a model call.
pub fn is_credential_check(fault: &RemoteFault) -> bool {
    fault.kind == FaultKind::AccessDenied
        || fault.message.contains("security.check")
        || fault
            .detail
            .as_deref()
            .is_some_and(|d| d.contains("security.check"))
}

/// Check whether a fault reports that `database` does not exist.
pub fn is_missing_database(fault: &RemoteFault, database: &str) -> bool {
    let needle = format!("database \"{database}\" does not exist");
    fault.message.contains(&needle)
        || fault.detail.as_deref().is_some_and(|d| d.contains(&needle))
}
