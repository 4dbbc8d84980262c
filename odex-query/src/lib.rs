//! # odex-query
//!
//! Relational field resolution for the odex client.
//!
//! This crate holds everything that does not depend on a particular wire
//! protocol:
//! - Wire values, record ids and resolved records
//! - Field specifications mixing plain names and relation descriptors
//! - A planner that reads each relation once per request, not once per record
//! - The assembler that nests related records into their owners
//! - The per-collection accessor (`search`, `browse`, `create`, ...)
//! - Error and logging infrastructure
//!
//! The transport itself is abstracted behind [`Transport`]; `odex-jsonrpc`
//! provides the HTTP implementation.
//!
//! ## Field specifications
//!
//! ```rust
//! use odex_query::{FieldSelection, FieldSpec, many_to_one, to_many};
//!
//! let fields: Vec<FieldSpec> = vec![
//!     "name".into(),
//!     many_to_one("partner_id", "res.partner", ["name", "email"]).into(),
//!     to_many("order_line", "sale.order.line", ["name", "price_unit"])
//!         .field(many_to_one("product_id", "product.product", ["default_code"]))
//!         .into(),
//! ];
//!
//! let selection = FieldSelection::parse(&fields).unwrap();
//! assert_eq!(selection.relation_count(), 3);
//! ```
//!
//! ## Domains
//!
//! ```rust
//! use odex_query::Domain;
//!
//! let domain = Domain::all()
//!     .or()
//!     .filter("state", "=", "sale")
//!     .filter("state", "=", "done");
//! assert_eq!(domain.len(), 3);
//! ```
//!
//! ## Reading through a transport
//!
//! ```rust,ignore
//! use odex_query::prelude::*;
//!
//! let orders = transport
//!     .collection("sale.order")
//!     .search_browse(
//!         Domain::all().filter("state", "=", "sale"),
//!         &["name".into(), many_to_one("partner_id", "res.partner", ["name"]).into()],
//!         SearchOptions::new().limit(20),
//!     )
//!     .await?;
//! ```

pub mod collection;
pub mod domain;
pub mod error;
pub mod logging;
pub mod record;
pub mod relations;
pub mod traits;
pub mod value;

pub use collection::{Collection, SearchOptions, TransportExt};
pub use domain::Domain;
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use record::{FieldValue, RawRecord, Record, RecordId};
pub use relations::{
    FieldSelection, FieldSpec, RelationKind, RelationLoadStrategy, RelationLoader, RelationSpec,
    many_to_one, to_many,
};
pub use traits::{BoxFuture, FaultKind, RecordFetcher, RemoteFault, Transport};
pub use value::{CallArgs, Value, Values};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::collection::{Collection, SearchOptions, TransportExt};
    pub use crate::domain::Domain;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::record::{FieldValue, Record, RecordId};
    pub use crate::relations::{
        FieldSpec, RelationLoadStrategy, RelationSpec, many_to_one, to_many,
    };
    pub use crate::traits::{FaultKind, RemoteFault, Transport};
    pub use crate::value::{CallArgs, Value, Values};
}
