//! Error types and SNAFU context selectors for the catalog and table API.
//!
//! `CatalogError` is the only error callers of the catalog, table handle, and
//! format adapter see. Lower layers ([`StorageError`], [`CommitError`],
//! [`SchemaError`]) are folded into it here so that every public operation
//! reports the same small taxonomy.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use snafu::prelude::*;

use crate::{
    schema::{SchemaError, SchemaMismatch},
    storage::StorageError,
    transaction_log::CommitError,
};

/// Errors from catalog, table, and format-adapter operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CatalogError {
    /// The backing store could not be reached or failed an I/O request.
    #[snafu(display("Catalog backing store unavailable: {source}"))]
    CatalogUnavailable {
        /// Underlying storage error.
        #[snafu(backtrace)]
        source: StorageError,
    },

    /// No table exists under the identifier.
    #[snafu(display("Table {identifier} does not exist"))]
    NotFound {
        /// Qualified table identifier.
        identifier: String,
    },

    /// The namespace has not been created.
    #[snafu(display("Namespace {namespace} does not exist"))]
    NamespaceNotFound {
        /// Namespace name.
        namespace: String,
    },

    /// The dataset does not fit the table's bound schema.
    #[snafu(display("Dataset is incompatible with the schema of {identifier}: {source}"))]
    SchemaMismatch {
        /// Qualified table identifier.
        identifier: String,
        /// What disagreed.
        source: SchemaMismatch,
    },

    /// A namespace or table name is malformed.
    #[snafu(display("Invalid identifier {identifier:?}: {reason}"))]
    InvalidIdentifier {
        /// The rejected identifier.
        identifier: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A dataset schema cannot be bound to a table.
    #[snafu(display("Invalid table schema: {source}"))]
    InvalidSchema {
        /// Underlying schema error (for example an unsupported column type).
        source: SchemaError,
    },

    /// A catalog property has a value that cannot be used.
    #[snafu(display("Invalid catalog property {key}={value:?}: {reason}"))]
    InvalidConfig {
        /// Property key.
        key: String,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Concurrent writers kept winning the commit race.
    #[snafu(display("Gave up committing to {identifier} after {attempts} conflicting attempts"))]
    CommitConflict {
        /// Qualified table identifier.
        identifier: String,
        /// Number of commit attempts made.
        attempts: u32,
    },

    /// Requested a table version that has not been committed.
    #[snafu(display("Table {identifier} has no version {version} (latest is {latest})"))]
    VersionNotFound {
        /// Qualified table identifier.
        identifier: String,
        /// Requested version.
        version: u64,
        /// Latest committed version.
        latest: u64,
    },

    /// Persisted catalog or table metadata is malformed.
    #[snafu(display("Corrupt state in {identifier}: {msg}"))]
    CorruptState {
        /// Namespace or table identifier the state belongs to.
        identifier: String,
        /// Description of the problem.
        msg: String,
    },

    /// Arrow error while building or combining batches.
    #[snafu(display("Arrow error: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// Parquet error while encoding or decoding a batch file.
    #[snafu(display("Parquet error: {source}"))]
    Parquet {
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// The runtime backing the blocking API could not be started.
    #[snafu(display("Failed to start async runtime: {source}"))]
    Runtime {
        /// Underlying I/O error from the runtime builder.
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Fold a commit-log error for `identifier` into the public taxonomy.
    pub(crate) fn from_commit(identifier: impl Into<String>, err: CommitError) -> Self {
        let identifier = identifier.into();
        match err {
            CommitError::Storage { source } => CatalogError::CatalogUnavailable { source },
            CommitError::CorruptState { msg, .. } => CatalogError::CorruptState { identifier, msg },
            CommitError::Conflict { .. } => CatalogError::CommitConflict {
                identifier,
                attempts: 1,
            },
        }
    }

    /// Whether the error is [`CatalogError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}
