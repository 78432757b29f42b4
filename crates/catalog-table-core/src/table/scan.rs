//! Full-table scans.
//!
//! A [`TableScan`] is pinned to the table state it was created from: batches
//! committed after the scan was built are not part of it. Batch files are
//! read lazily, one at a time, in commit order. Every decoded batch is
//! rebound to the table's Arrow schema so callers always see the bound
//! schema regardless of how the Parquet reader reconstructs it.
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use snafu::prelude::*;
use tracing::debug;

use crate::{
    catalog::{
        CatalogError,
        error::{ArrowSnafu, CatalogUnavailableSnafu, ParquetSnafu},
    },
    storage::{self, StorageError, StorageLocation},
    table::Table,
    transaction_log::{BatchMeta, TableState},
};

/// Stream of committed batches, oldest first.
pub type BatchStream = Pin<Box<dyn Stream<Item = Result<RecordBatch, CatalogError>> + Send>>;

/// Lazy view over the batches of one table version.
pub struct TableScan {
    schema: SchemaRef,
    version: u64,
    row_count: u64,
    batches: BatchStream,
}

impl std::fmt::Debug for TableScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableScan")
            .field("version", &self.version)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

async fn read_batch_file(
    location: &StorageLocation,
    identifier: &str,
    batch: &BatchMeta,
    schema: &SchemaRef,
) -> Result<Vec<RecordBatch>, CatalogError> {
    let bytes = match storage::read_all_bytes(location, Path::new(&batch.path)).await {
        Ok(bytes) => bytes,
        Err(StorageError::NotFound { .. }) => {
            return Err(CatalogError::CorruptState {
                identifier: identifier.to_string(),
                msg: format!("committed batch {} is missing at {}", batch.batch_id, batch.path),
            });
        }
        Err(source) => return Err(CatalogError::CatalogUnavailable { source }),
    };

    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))
        .context(ParquetSnafu)?
        .build()
        .context(ParquetSnafu)?;

    let mut out = Vec::new();
    for decoded in reader {
        let decoded = decoded.context(ArrowSnafu)?;
        let rebound =
            RecordBatch::try_new(schema.clone(), decoded.columns().to_vec()).context(ArrowSnafu)?;
        out.push(rebound);
    }
    Ok(out)
}

impl TableScan {
    pub(crate) fn new(table: &Table, state: TableState) -> Self {
        let schema = table.arrow_schema();
        let version = state.version;
        let row_count = state.row_count();
        let location = table.location().clone();
        let identifier = table.identifier().to_string();

        debug!(
            parent: &table.span,
            version,
            batches = state.batches.len(),
            rows = row_count,
            "scan planned"
        );

        let stream_schema = schema.clone();
        let stream = futures::stream::iter(state.batches)
            .then(move |batch| {
                let location = location.clone();
                let identifier = identifier.clone();
                let schema = stream_schema.clone();

                async move {
                    let batches = read_batch_file(&location, &identifier, &batch, &schema).await?;
                    Ok::<_, CatalogError>(futures::stream::iter(
                        batches.into_iter().map(Ok::<_, CatalogError>),
                    ))
                }
            })
            .try_flatten();

        Self {
            schema,
            version,
            row_count,
            batches: Box::pin(stream),
        }
    }

    /// Schema every batch of this scan has.
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Table version the scan reads.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Rows the scan will produce, from commit metadata.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// The underlying batch stream.
    pub fn into_stream(self) -> BatchStream {
        self.batches
    }

    /// Consume the scan and concatenate its batches in commit order.
    ///
    /// A table with no batches yields a zero-row dataset carrying the bound
    /// schema.
    pub async fn to_dataset(self) -> Result<RecordBatch, CatalogError> {
        let schema = self.schema.clone();
        let batches: Vec<RecordBatch> = self.batches.try_collect().await?;

        if batches.is_empty() {
            return Ok(RecordBatch::new_empty(schema));
        }
        concat_batches(&schema, &batches).context(ArrowSnafu)
    }
}

impl Stream for TableScan {
    type Item = Result<RecordBatch, CatalogError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.batches.as_mut().poll_next(cx)
    }
}
