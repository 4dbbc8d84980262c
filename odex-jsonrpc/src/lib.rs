//! # odex-jsonrpc
//!
//! HTTP transport for the odex client, speaking the service's JSON-RPC
//! protocol.
//!
//! This crate provides:
//! - Connection configuration from a builder, a URL or the environment
//! - One-time authentication and an explicit, cloneable session handle
//! - The request/response envelope and server exception classification
//! - A [`Transport`](odex_query::Transport) implementation, so every
//!   collection accessor works over it
//!
//! ## Example
//!
//! ```rust,ignore
//! use odex_jsonrpc::{OdooClient, OdooConfig};
//! use odex_query::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OdooConfig::builder()
//!         .url("https://erp.example.com")
//!         .database("prod")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!     let client = OdooClient::connect(config).await?;
//!
//!     let orders = client
//!         .collection("sale.order")
//!         .browse(
//!             &[RecordId(5)],
//!             &["name".into(), many_to_one("partner_id", "res.partner", ["name"]).into()],
//!         )
//!         .await?;
//!     println!("{}", orders[0].to_json());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;

pub use client::OdooClient;
pub use config::{EnvSource, MapEnvSource, OdooConfig, OdooConfigBuilder, StdEnvSource};
pub use error::{RpcError, RpcResult};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::OdooClient;
    pub use crate::config::{OdooConfig, OdooConfigBuilder};
    pub use crate::error::{RpcError, RpcResult};
}
