//! Log actions and commit payload definitions.
//!
//! Each commit file stores one [`Commit`] whose ordered [`LogAction`]s
//! evolve table state. This module only defines the log's "verbs"; the data
//! they carry lives in [`super::table_meta`] and [`super::batches`].
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transaction_log::{batches::BatchMeta, table_meta::TableMeta};

/// An action recorded in a commit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogAction {
    /// Create the table and bind its schema. Only valid in commit 1.
    CreateTable(TableMeta),

    /// Append one data batch to the table.
    AppendBatch(BatchMeta),
}

/// A single, immutable commit in the log.
///
/// `version` must match the file name; `base_version` records the head the
/// writer observed when preparing the commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    /// Version of this commit (monotonic, starting at 1).
    pub version: u64,

    /// Head version the writer built this commit on.
    pub base_version: u64,

    /// Commit creation time, stored as RFC3339 UTC.
    pub timestamp: DateTime<Utc>,

    /// Ordered actions applied by this commit.
    pub actions: Vec<LogAction>,
}

impl Commit {
    /// Rows appended by this commit.
    pub fn appended_rows(&self) -> u64 {
        self.actions
            .iter()
            .map(|action| match action {
                LogAction::AppendBatch(batch) => batch.row_count,
                LogAction::CreateTable(_) => 0,
            })
            .sum()
    }
}
