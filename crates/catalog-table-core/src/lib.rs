//! Core engine for catalog-managed tables.
//!
//! This crate provides the pieces behind `catalog-table`:
//!
//! - A [`format::CatalogFormat`] adapter exposing `put`/`get` for one table,
//!   creating the table on first write (`format` module), plus a synchronous
//!   wrapper (`blocking` module).
//! - A [`catalog::Catalog`] that maps `<namespace>.<name>` identifiers to
//!   physical tables inside a warehouse directory, with idempotent namespace
//!   and table creation (`catalog` module).
//! - A [`table::Table`] handle for schema-checked appends and ordered
//!   full-table scans (`table` module).
//! - A Delta-inspired, append-only commit log per table with version-guard
//!   optimistic concurrency control (`transaction_log` module).
//! - Logical schemas bound at table creation and the append-time
//!   compatibility rules (`schema` module).
//! - Storage helpers for atomic replace and atomic create-if-absent writes
//!   against the warehouse (`storage` and `layout` modules).
//!
//! Datasets are Arrow [`RecordBatch`](arrow::array::RecordBatch)es; batch
//! files are Parquet.
#![deny(missing_docs)]
pub mod blocking;
pub mod catalog;
pub mod format;
pub mod layout;
pub mod schema;
pub mod storage;
pub mod table;
pub mod transaction_log;

#[cfg(test)]
pub(crate) mod test_util;

/// Common imports for users of the adapter and catalog API.
pub mod prelude {
    pub use crate::blocking::BlockingCatalogFormat;
    pub use crate::catalog::{Catalog, CatalogConfig, CatalogError, TableIdent};
    pub use crate::format::{CatalogFormat, Format, FormatOptions};
    pub use crate::table::{Table, TableScan};
}
