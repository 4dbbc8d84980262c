//! # odex
//!
//! A typed, call-efficient client for Odoo-style object-relational RPC
//! services.
//!
//! odex provides:
//! - Record search, projection, create/update/delete and arbitrary method calls
//! - Nested field requests resolved with one read per relation, not per record
//! - An explicit session handle instead of global connection state
//! - Async-first design built on Tokio and reqwest
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use odex::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OdooClient::connect(OdooConfig::from_env()?).await?;
//!
//!     // sale.order, res.partner and sale.order.line are each read once,
//!     // however many orders match.
//!     let orders = client
//!         .collection("sale.order")
//!         .search_browse(
//!             Domain::all().filter("state", "=", "sale"),
//!             &[
//!                 "name".into(),
//!                 many_to_one("partner_id", "res.partner", ["name", "email"]).into(),
//!                 to_many("order_line", "sale.order.line", ["name", "price_subtotal"]).into(),
//!             ],
//!             SearchOptions::new().limit(50),
//!         )
//!         .await?;
//!
//!     for order in &orders {
//!         println!("{}", order.to_json());
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Resolution core: values, records, field specifications and accessors.
pub mod query {
    pub use odex_query::*;
}

/// JSON-RPC transport and session handling.
pub mod jsonrpc {
    pub use odex_jsonrpc::*;
}

pub use odex_query::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use odex_jsonrpc::prelude::*;
    pub use odex_query::prelude::*;
}

// Re-export key types at the crate root
pub use odex_jsonrpc::{OdooClient, OdooConfig, RpcError};
pub use odex_query::{
    Collection, Domain, FieldSpec, QueryError, QueryResult, Record, RecordId, Transport,
    TransportExt, Value,
};
