//! Per-table append-only commit log.
//!
//! Every table owns a `_catalog_log/` directory of JSON commits. Commit 1
//! creates the table and binds its schema; every later commit appends one
//! data batch. Table state is rebuilt by replaying commits in version order,
//! which is also the commit order datasets are returned in.
//!
//! ## Concurrency
//!
//! Commits are guarded by version: a writer prepares commit `n + 1` against
//! the head `n` it observed and creates the commit file with create-if-absent
//! semantics ([`crate::storage::write_new`]). Of several writers racing for
//! the same version exactly one succeeds; the others see a conflict and must
//! re-read the head. Because commit 1 is the table-creation commit, the same
//! primitive gives "at most one table per identifier".
//!
//! Commit files are the source of truth. `CURRENT` only records the latest
//! version a writer knew about; readers start from it and roll forward over
//! any newer commit files, so a writer that dies between creating its commit
//! and updating `CURRENT` leaves a fully valid log behind.
//!
//! ## Example commit
//!
//! ```json
//! {
//!   "version": 2,
//!   "base_version": 1,
//!   "timestamp": "2025-01-01T00:00:00Z",
//!   "actions": [
//!     {
//!       "AppendBatch": {
//!         "batch_id": "0f4c2d3e9a9b4a7c8d6e5f4a3b2c1d0e",
//!         "path": "data/0f4c2d3e9a9b4a7c8d6e5f4a3b2c1d0e.parquet",
//!         "format": "parquet",
//!         "row_count": 10
//!       }
//!     }
//!   ]
//! }
//! ```
pub mod actions;
pub mod batches;
pub mod log_store;
/// Table metadata written at creation.
pub mod table_meta;
pub mod table_state;

pub use actions::{Commit, LogAction};
pub use batches::{BatchId, BatchMeta, FileFormat};
pub use log_store::TransactionLogStore;
pub use table_meta::TableMeta;
pub use table_state::{CommitInfo, TableState};

use snafu::{Backtrace, prelude::*};

use crate::storage::StorageError;

/// Errors that can occur while reading or writing the commit log.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CommitError {
    /// The caller's expected version is not the head of the log.
    #[snafu(display("Commit conflict: expected version {expected}, but head is {found}"))]
    Conflict {
        /// The version the caller expected to be the head.
        expected: u64,
        /// The head version actually found.
        found: u64,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// Underlying storage error while working with the log.
    #[snafu(display("Storage error while accessing commit log: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(backtrace)]
        source: StorageError,
    },

    /// The log is in an unexpected or malformed state.
    #[snafu(display("Corrupt log state: {msg}"))]
    CorruptState {
        /// A description of the corrupt state.
        msg: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },
}

impl CommitError {
    /// Whether this error means another writer won the race for the version.
    ///
    /// Covers both the advisory head check and the create-if-absent guard on
    /// the commit file itself.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CommitError::Conflict { .. }
                | CommitError::Storage {
                    source: StorageError::AlreadyExists { .. }
                }
        )
    }
}
