//! Table handles.
//!
//! A [`Table`] represents one physical table: its identifier, the schema bound
//! when it was created, and its commit log. It caches nothing but that
//! immutable metadata; every scan and append goes back to the log, so a
//! handle never serves state that disagrees with storage.
//!
//! - [`append`] writes one dataset as a new committed batch.
//! - [`scan`] streams committed batches in commit order and materializes
//!   them into a single dataset.

pub mod append;
pub mod scan;

pub use scan::{BatchStream, TableScan};

use arrow::datatypes::SchemaRef;
use chrono::{DateTime, Utc};
use tracing::{Span, info_span};
use uuid::Uuid;

use crate::{
    catalog::{CatalogError, TableIdent, error::VersionNotFoundSnafu},
    schema::LogicalSchema,
    storage::StorageLocation,
    transaction_log::{CommitInfo, TableMeta, TransactionLogStore},
};

/// Handle to one physical table.
#[derive(Debug, Clone)]
pub struct Table {
    ident: TableIdent,
    meta: TableMeta,
    arrow_schema: SchemaRef,
    log: TransactionLogStore,
    commit_max_attempts: u32,
    span: Span,
}

impl Table {
    pub(crate) fn new(
        ident: TableIdent,
        meta: TableMeta,
        log: TransactionLogStore,
        commit_max_attempts: u32,
        parent: Span,
    ) -> Self {
        let span = info_span!(parent: &parent, "table", table = %ident);
        let arrow_schema = meta.schema.to_arrow_schema();
        Self {
            ident,
            meta,
            arrow_schema,
            log: log.with_span(span.clone()),
            commit_max_attempts,
            span,
        }
    }

    /// Qualified identifier.
    pub fn identifier(&self) -> &TableIdent {
        &self.ident
    }

    /// Schema bound at creation.
    pub fn schema(&self) -> &LogicalSchema {
        &self.meta.schema
    }

    /// Schema bound at creation, as Arrow.
    pub fn arrow_schema(&self) -> SchemaRef {
        self.arrow_schema.clone()
    }

    /// Metadata from the creation commit.
    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    /// Random id assigned when the table was created.
    pub fn table_uuid(&self) -> Uuid {
        self.meta.table_uuid
    }

    /// When the table was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at
    }

    pub(crate) fn location(&self) -> &StorageLocation {
        self.log.location()
    }

    fn commit_err(&self, err: crate::transaction_log::CommitError) -> CatalogError {
        CatalogError::from_commit(self.ident.to_string(), err)
    }

    /// Latest committed version.
    pub async fn current_version(&self) -> Result<u64, CatalogError> {
        self.log
            .load_current_version()
            .await
            .map_err(|e| self.commit_err(e))
    }

    /// Every committed version, oldest first.
    pub async fn history(&self) -> Result<Vec<CommitInfo>, CatalogError> {
        self.log.history().await.map_err(|e| self.commit_err(e))
    }

    /// Lazy view over all committed batches, oldest first.
    pub async fn scan(&self) -> Result<TableScan, CatalogError> {
        let state = self
            .log
            .rebuild_table_state()
            .await
            .map_err(|e| self.commit_err(e))?;
        Ok(TableScan::new(self, state))
    }

    /// Like [`Table::scan`], reading the table as it was at `version`.
    pub async fn scan_at(&self, version: u64) -> Result<TableScan, CatalogError> {
        let latest = self.current_version().await?;
        if version == 0 || version > latest {
            return VersionNotFoundSnafu {
                identifier: self.ident.to_string(),
                version,
                latest,
            }
            .fail();
        }

        let state = self
            .log
            .rebuild_table_state_at(version)
            .await
            .map_err(|e| self.commit_err(e))?;
        Ok(TableScan::new(self, state))
    }
}
