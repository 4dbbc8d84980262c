//! Relational field resolution.
//!
//! This module turns a nested field request into batched reads:
//! - [`FieldSpec`] / [`RelationSpec`] describe what to read
//! - [`FieldSelection`] validates and partitions a field list
//! - [`RelationLoader`] issues one base read plus one read per relation
//! - [`assemble`] merges the results into nested [`Record`](crate::Record)s
//!
//! ## Example
//!
//! ```rust,ignore
//! // Two reads in total, however many orders match.
//! let orders = client
//!     .collection("sale.order")
//!     .browse(
//!         &[RecordId(5), RecordId(6)],
//!         &[
//!             "name".into(),
//!             many_to_one("partner_id", "res.partner", ["name", "email"]).into(),
//!         ],
//!     )
//!     .await?;
//! ```

mod assemble;
mod loader;
mod select;
mod spec;

pub use assemble::assemble;
pub use loader::{Fetched, RelationLoadStrategy, RelationLoader, ResolvedRelation, collect_ids};
pub use select::{FieldSelection, FieldSlot, FieldSpec, RelationPlan};
pub use spec::{RelationKind, RelationSpec, many_to_one, to_many};
