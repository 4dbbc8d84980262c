//! Per-collection accessor.
//!
//! [`Collection`] is the public face of one remote collection. Plain reads and
//! writes forward straight to the transport; `browse` and `search_browse` go
//! through the [`RelationLoader`] so nested field requests stay batched.
//!
//! ```rust,ignore
//! use odex_query::prelude::*;
//!
//! let orders = client.collection("sale.order");
//! let ids = orders
//!     .search(Domain::all().filter("state", "=", "sale"), SearchOptions::new().limit(10))
//!     .await?;
//! let records = orders
//!     .browse(&ids, &["name".into(), to_many("order_line", "sale.order.line", ["name"]).into()])
//!     .await?;
//! ```

use tracing::{debug, error, info};

use crate::domain::Domain;
use crate::error::{ErrorCode, QueryError, QueryResult};
use crate::record::{Record, RecordId};
use crate::relations::{FieldSelection, FieldSpec, RelationLoadStrategy, RelationLoader, assemble};
use crate::traits::{FaultKind, RemoteFault, Transport, raw_records};
use crate::value::{CallArgs, Value, Values};

/// Paging and ordering for searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Number of matching records to skip.
    pub offset: Option<u64>,
    /// Maximum number of records to return.
    pub limit: Option<u64>,
    /// Server-side sort specification, e.g. `"date_order desc, id"`.
    pub order: Option<String>,
}

impl SearchOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip `n` records.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Return at most `n` records.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sort by the given specification.
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Add the set options as keyword arguments. Zero offsets and limits
    /// are left out, as the service treats them as "unset".
    fn apply(&self, mut args: CallArgs) -> CallArgs {
        if let Some(offset) = self.offset.filter(|n| *n > 0) {
            args = args.kwarg("offset", offset as i64);
        }
        if let Some(limit) = self.limit.filter(|n| *n > 0) {
            args = args.kwarg("limit", limit as i64);
        }
        if let Some(ref order) = self.order {
            args = args.kwarg("order", order.as_str());
        }
        args
    }
}

/// Accessor for one remote collection.
pub struct Collection<'t, T: Transport + ?Sized> {
    transport: &'t T,
    name: String,
    strategy: RelationLoadStrategy,
}

impl<'t, T: Transport + ?Sized> Collection<'t, T> {
    /// Create an accessor for `name` over `transport`.
    pub fn new(transport: &'t T, name: impl Into<String>) -> Self {
        Self {
            transport,
            name: name.into(),
            strategy: RelationLoadStrategy::default(),
        }
    }

    /// Set how relation reads are scheduled.
    pub fn with_strategy(mut self, strategy: RelationLoadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Name of the collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, method: &str, args: CallArgs) -> QueryResult<Value> {
        self.transport
            .invoke(&self.name, method, args)
            .await
            .map_err(|fault| self.fault_error(method, fault))
    }

    fn fault_error(&self, method: &str, fault: RemoteFault) -> QueryError {
        QueryError::remote_operation(&self.name, method, &fault).with_source(fault)
    }

    fn loader(&self) -> RelationLoader<'_, T> {
        RelationLoader::new(self.transport).with_strategy(self.strategy)
    }

    // ============== Read ==============

    /// Search for records matching `domain`, returning their ids.
    pub async fn search(
        &self,
        domain: impl Into<Domain>,
        options: SearchOptions,
    ) -> QueryResult<Vec<RecordId>> {
        let domain = domain.into();
        debug!(collection = %self.name, domain = ?domain, "Search");

        let args = options.apply(CallArgs::new().arg(domain));
        let response = self.invoke("search", args).await?;
        ids_from(&response)
    }

    /// Read records and the requested fields, expanding relation descriptors
    /// into nested records.
    ///
    /// Issues one read for `ids` plus one read per relation descriptor that
    /// references at least one record, regardless of how many ids are given.
    pub async fn browse(&self, ids: &[RecordId], fields: &[FieldSpec]) -> QueryResult<Vec<Record>> {
        let selection = FieldSelection::parse(fields)?;
        debug!(collection = %self.name, ids = ids.len(), "Read");

        self.loader().browse(&self.name, ids, &selection).await
    }

    /// Read a single record, `None` if it does not exist or is not visible.
    ///
    /// A missing-record fault on the base read counts as absence. Failures
    /// while resolving its relations still propagate.
    pub async fn browse_one(&self, id: RecordId, fields: &[FieldSpec]) -> QueryResult<Option<Record>> {
        match self.browse(&[id], fields).await {
            Ok(records) => Ok(records.into_iter().find(|record| record.id == id)),
            Err(err) if is_missing_read(&err) => {
                debug!(collection = %self.name, id = %id, "Record does not exist");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Search and read in one go, expanding relation descriptors.
    pub async fn search_browse(
        &self,
        domain: impl Into<Domain>,
        fields: &[FieldSpec],
        options: SearchOptions,
    ) -> QueryResult<Vec<Record>> {
        let selection = FieldSelection::parse(fields)?;
        let domain = domain.into();
        debug!(collection = %self.name, domain = ?domain, "Search_Read");

        let args = options.apply(
            CallArgs::new()
                .arg(domain)
                .kwarg("fields", selection.remote_fields()),
        );
        let base = raw_records(self.invoke("search_read", args).await?)?;

        let resolved = self.loader().resolve(&base, &selection).await?;
        assemble(base, &selection, &resolved)
    }

    /// Count records matching `domain`.
    pub async fn search_count(&self, domain: impl Into<Domain>) -> QueryResult<u64> {
        let domain = domain.into();
        debug!(collection = %self.name, domain = ?domain, "Search_Count");

        let response = self.invoke("search_count", CallArgs::new().arg(domain)).await?;
        match response {
            Value::Int(n) if n >= 0 => Ok(n as u64),
            other => Err(QueryError::deserialization(format!(
                "search_count returned {}",
                other.kind()
            ))),
        }
    }

    // ============== Write ==============

    /// Create a record, returning its id.
    pub async fn create(&self, values: Values) -> QueryResult<RecordId> {
        info!(collection = %self.name, fields = values.len(), "Create");

        let response = self.invoke("create", CallArgs::new().arg(values)).await?;
        response
            .as_record_id()
            .or_else(|| response.as_list().and_then(|ids| ids.first()?.as_record_id()))
            .ok_or_else(|| {
                QueryError::deserialization(format!("create returned {}", response.kind()))
            })
    }

    /// Update existing records.
    pub async fn write(&self, ids: &[RecordId], values: Values) -> QueryResult<bool> {
        info!(collection = %self.name, ids = ?ids, fields = values.len(), "Write");

        let response = self
            .invoke("write", CallArgs::new().arg(ids).arg(values))
            .await?;
        Ok(response.as_bool().unwrap_or(false))
    }

    /// Delete records.
    ///
    /// Returns `false` instead of failing when the records no longer exist or
    /// other records still depend on them.
    pub async fn delete(&self, ids: &[RecordId]) -> QueryResult<bool> {
        info!(collection = %self.name, ids = ?ids, "Unlink");

        match self
            .transport
            .invoke(&self.name, "unlink", CallArgs::new().arg(ids))
            .await
        {
            Ok(response) => Ok(response.as_bool().unwrap_or(false)),
            Err(fault) if is_missing_records(&fault) => {
                error!(collection = %self.name, ids = ?ids, "Could not delete records: do not exist");
                Ok(false)
            }
            Err(fault) if is_still_referenced(&fault) => {
                error!(collection = %self.name, ids = ?ids, "Could not delete records: other records rely on these");
                Ok(false)
            }
            Err(fault) => Err(self.fault_error("unlink", fault).with_ids(ids.iter().copied())),
        }
    }

    // ============== Calls ==============

    /// Call a method on specific records. The ids are passed as the first
    /// positional argument.
    pub async fn call(&self, ids: &[RecordId], method: &str, args: CallArgs) -> QueryResult<Value> {
        debug!(collection = %self.name, method = %method, ids = ?ids, "Call_Records");
        self.invoke(method, args.prepend(ids)).await
    }

    /// Call a collection-level method.
    pub async fn call_model(&self, method: &str, args: CallArgs) -> QueryResult<Value> {
        debug!(collection = %self.name, method = %method, "Call_Model");
        self.invoke(method, args).await
    }
}

impl<T: Transport + ?Sized> Clone for Collection<'_, T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport,
            name: self.name.clone(),
            strategy: self.strategy,
        }
    }
}

/// Access collections from any transport.
pub trait TransportExt: Transport {
    /// Get an accessor for the named collection.
    fn collection(&self, name: impl Into<String>) -> Collection<'_, Self> {
        Collection::new(self, name)
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

fn ids_from(response: &Value) -> QueryResult<Vec<RecordId>> {
    response.to_many_ids().map_err(|e| e.with_operation("search"))
}

fn is_missing_records(fault: &RemoteFault) -> bool {
    fault.kind == FaultKind::Missing
}

fn is_missing_read(err: &QueryError) -> bool {
    err.code == ErrorCode::RemoteOperation && err.remote_fault().is_some_and(is_missing_records)
}

fn is_still_referenced(fault: &RemoteFault) -> bool {
    fault.kind == FaultKind::UserError && fault.message.contains("archive it instead")
}
