//! Append pipeline for [`Table`].
//!
//! 1. Check the dataset against the bound schema and rebind it to the table's
//!    Arrow schema (this is where nulls in non-nullable columns are caught).
//! 2. Encode the dataset as Parquet and write it under `data/` with a fresh
//!    batch id. The file is not visible to readers until a commit names it.
//! 3. Commit `AppendBatch` on top of the current head. Losing the race for a
//!    version only means another append landed first, so the commit (not the
//!    data write) is retried on the new head, up to the configured limit.
//! 4. If the commit fails for good, the batch file is removed again.

use std::path::Path;

use arrow::array::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    catalog::{
        CatalogError,
        error::{CatalogUnavailableSnafu, CommitConflictSnafu, ParquetSnafu, SchemaMismatchSnafu},
    },
    schema::{LogicalSchema, SchemaMismatch, ensure_compatible},
    storage,
    table::Table,
    transaction_log::{BatchId, BatchMeta, LogAction},
};

fn encode_parquet(batch: &RecordBatch) -> Result<Vec<u8>, CatalogError> {
    let props = WriterProperties::builder().build();
    let mut writer =
        ArrowWriter::try_new(Vec::new(), batch.schema(), Some(props)).context(ParquetSnafu)?;
    writer.write(batch).context(ParquetSnafu)?;
    writer.into_inner().context(ParquetSnafu)
}

impl Table {
    /// Check `batch` against the bound schema and return it rebound to the
    /// table's Arrow schema.
    fn conform(&self, batch: &RecordBatch) -> Result<RecordBatch, CatalogError> {
        let identifier = self.ident.to_string();

        let incoming = LogicalSchema::from_arrow(batch.schema().as_ref()).map_err(|e| {
            CatalogError::SchemaMismatch {
                identifier: identifier.clone(),
                source: SchemaMismatch::Data {
                    message: e.to_string(),
                },
            }
        })?;
        ensure_compatible(self.schema(), &incoming).context(SchemaMismatchSnafu {
            identifier: identifier.clone(),
        })?;

        RecordBatch::try_new(self.arrow_schema.clone(), batch.columns().to_vec()).map_err(|e| {
            CatalogError::SchemaMismatch {
                identifier,
                source: SchemaMismatch::Data {
                    message: e.to_string(),
                },
            }
        })
    }

    /// Append `batch` as a new committed batch and return the new version.
    ///
    /// The batch must match the bound schema: same column names in the same
    /// order with the same types, and no nulls in non-nullable columns.
    /// Otherwise fails with [`CatalogError::SchemaMismatch`] and the table is
    /// left unchanged. Once this returns, the rows are visible to every scan
    /// started afterwards.
    pub async fn append(&self, batch: &RecordBatch) -> Result<u64, CatalogError> {
        let batch = self.conform(batch)?;
        let meta = BatchMeta::new(BatchId::random(), batch.num_rows() as u64);
        let bytes = encode_parquet(&batch)?;

        storage::write_new(self.location(), Path::new(&meta.path), &bytes)
            .await
            .context(CatalogUnavailableSnafu)?;

        match self.commit_batch(&meta).await {
            Ok(version) => {
                info!(
                    parent: &self.span,
                    version,
                    batch_id = %meta.batch_id,
                    rows = meta.row_count,
                    "batch appended"
                );
                Ok(version)
            }
            Err(err) => {
                if let Err(cleanup) = storage::remove_file(self.location(), Path::new(&meta.path)).await
                {
                    warn!(
                        parent: &self.span,
                        batch_id = %meta.batch_id,
                        error = %cleanup,
                        "failed to remove uncommitted batch file"
                    );
                }
                Err(err)
            }
        }
    }

    async fn commit_batch(&self, meta: &BatchMeta) -> Result<u64, CatalogError> {
        for attempt in 1..=self.commit_max_attempts {
            let head = self.current_version().await?;
            match self
                .log
                .commit_with_expected_version(head, vec![LogAction::AppendBatch(meta.clone())])
                .await
            {
                Ok(version) => return Ok(version),
                Err(e) if e.is_conflict() => {
                    debug!(parent: &self.span, attempt, head, "commit conflict; retrying on new head");
                }
                Err(e) => return Err(CatalogError::from_commit(self.ident.to_string(), e)),
            }
        }

        CommitConflictSnafu {
            identifier: self.ident.to_string(),
            attempts: self.commit_max_attempts,
        }
        .fail()
    }
}
