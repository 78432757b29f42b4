//! Metadata describing committed data batches.
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::layout;

/// Identifier of a data batch, unique within a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub String);

impl BatchId {
    /// A fresh random batch id.
    pub fn random() -> Self {
        BatchId(Uuid::new_v4().simple().to_string())
    }
}

impl From<&str> for BatchId {
    fn from(s: &str) -> Self {
        BatchId(s.to_string())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File format of a batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Apache Parquet.
    #[default]
    Parquet,
}

/// One committed batch of rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchMeta {
    /// Batch identifier.
    pub batch_id: BatchId,
    /// Path of the batch file relative to the table root.
    pub path: String,
    /// File format of the batch file.
    #[serde(default)]
    pub format: FileFormat,
    /// Number of rows in the batch.
    pub row_count: u64,
}

impl BatchMeta {
    /// Batch metadata using the conventional `data/<id>.parquet` path.
    pub fn new(batch_id: BatchId, row_count: u64) -> Self {
        let path = layout::batch_rel_path(&batch_id.0)
            .to_string_lossy()
            .replace('\\', "/");
        Self {
            batch_id,
            path,
            format: FileFormat::Parquet,
            row_count,
        }
    }
}
