//! Relative path conventions inside a warehouse.
//!
//! ```text
//! <warehouse>/
//!   <namespace>/
//!     _namespace.json              # namespace marker + metadata
//!     <table>/
//!       _catalog_log/
//!         CURRENT                  # hint: latest known committed version
//!         0000000001.json          # CreateTable
//!         0000000002.json          # AppendBatch
//!       data/
//!         <batch-id>.parquet
//! ```
//!
//! Functions here return relative [`PathBuf`] values; callers join them with
//! a [`crate::storage::StorageLocation`] before doing I/O. Names beginning
//! with `_` are reserved, which is why identifiers may not start with one.

use std::path::PathBuf;

use crate::catalog::TableIdent;

/// File that marks a directory as a namespace.
pub const NAMESPACE_FILE_NAME: &str = "_namespace.json";

/// Directory holding a table's commit log.
pub const LOG_DIR_NAME: &str = "_catalog_log";

/// Hint file naming the latest known committed version.
pub const CURRENT_FILE_NAME: &str = "CURRENT";

/// Number of digits used in zero-padded commit file names.
pub const COMMIT_FILENAME_DIGITS: usize = 10;

/// Directory holding a table's data batches.
pub const DATA_DIR_NAME: &str = "data";

/// Relative to the warehouse: `<namespace>/`
pub fn namespace_rel_dir(namespace: &str) -> PathBuf {
    PathBuf::from(namespace)
}

/// Relative to the warehouse: `<namespace>/_namespace.json`
pub fn namespace_marker_rel_path(namespace: &str) -> PathBuf {
    namespace_rel_dir(namespace).join(NAMESPACE_FILE_NAME)
}

/// Relative to the warehouse: `<namespace>/<table>/`
pub fn table_rel_dir(ident: &TableIdent) -> PathBuf {
    namespace_rel_dir(ident.namespace()).join(ident.name())
}

/// Relative to a table root: `_catalog_log/`
pub fn log_rel_dir() -> PathBuf {
    PathBuf::from(LOG_DIR_NAME)
}

/// Relative to a table root: `_catalog_log/CURRENT`
pub fn current_rel_path() -> PathBuf {
    log_rel_dir().join(CURRENT_FILE_NAME)
}

/// Relative to a table root: `_catalog_log/<zero-padded>.json`
pub fn commit_rel_path(version: u64) -> PathBuf {
    let file_name = format!("{:0width$}.json", version, width = COMMIT_FILENAME_DIGITS);
    log_rel_dir().join(file_name)
}

/// Relative to a table root: `data/<batch-id>.parquet`
pub fn batch_rel_path(batch_id: &str) -> PathBuf {
    PathBuf::from(DATA_DIR_NAME).join(format!("{batch_id}.parquet"))
}
