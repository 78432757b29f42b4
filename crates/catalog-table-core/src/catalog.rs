//! The catalog: namespaces and tables inside one warehouse.
//!
//! A [`Catalog`] is a thin coordinator over the warehouse directory. It keeps
//! no table state of its own; every lookup goes back to storage, so several
//! catalogs (in one process or many) can share a warehouse safely.
//!
//! Table creation is the first commit of the table's log. Because commit
//! files are created with create-if-absent semantics, concurrent
//! [`Catalog::create_table_if_not_exists`] calls for the same identifier
//! create at most one table; the losers simply load the winner's table.

/// Catalog connection config.
pub mod config;
pub mod error;
pub mod ident;
/// Namespace marker metadata.
pub mod namespace;

pub use config::CatalogConfig;
pub use error::CatalogError;
pub use ident::TableIdent;
pub use namespace::NamespaceMeta;

use arrow::datatypes::Schema;
use snafu::prelude::*;
use tracing::{Span, debug, info, info_span};

use crate::{
    catalog::error::{
        CatalogUnavailableSnafu, CorruptStateSnafu, InvalidSchemaSnafu, NamespaceNotFoundSnafu,
        NotFoundSnafu,
    },
    layout,
    schema::LogicalSchema,
    storage::{self, StorageError, StorageLocation},
    table::Table,
    transaction_log::{LogAction, TableMeta, TransactionLogStore},
};

/// Handle to a warehouse of namespaces and tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    location: StorageLocation,
    commit_max_attempts: u32,
    span: Span,
}

impl Catalog {
    /// Attach to the warehouse described by `config`, creating its root
    /// directory if needed.
    ///
    /// Fails with [`CatalogError::CatalogUnavailable`] when the warehouse
    /// cannot be created or reached.
    pub async fn open(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let span = info_span!("catalog", catalog = %config.identifier);
        Self::open_with_span(config, span).await
    }

    /// Like [`Catalog::open`], recording log events under `span`.
    pub async fn open_with_span(config: &CatalogConfig, span: Span) -> Result<Self, CatalogError> {
        let commit_max_attempts = config.commit_max_attempts()?;
        let location = StorageLocation::local(&config.warehouse_path);

        storage::ensure_root(&location)
            .await
            .context(CatalogUnavailableSnafu)?;

        debug!(parent: &span, warehouse = %location.display(), "catalog opened");

        Ok(Self {
            name: config.identifier.clone(),
            location,
            commit_max_attempts,
            span,
        })
    }

    /// Catalog identifier from the config.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Warehouse root.
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Span log events are recorded under.
    pub fn span(&self) -> &Span {
        &self.span
    }

    fn table_location(&self, ident: &TableIdent) -> StorageLocation {
        self.location.child(layout::table_rel_dir(ident))
    }

    fn log_store(&self, ident: &TableIdent) -> TransactionLogStore {
        TransactionLogStore::new(self.table_location(ident)).with_span(self.span.clone())
    }

    // ---------------------------------------------------------------------
    // Namespaces
    // ---------------------------------------------------------------------

    /// Ensure namespace `name` exists. Creating an existing namespace is a
    /// no-op.
    pub async fn create_namespace(&self, name: &str) -> Result<(), CatalogError> {
        ident::validate_part(name)?;

        let meta = NamespaceMeta::new(name);
        let json = serde_json::to_vec_pretty(&meta).map_err(|e| CatalogError::CorruptState {
            identifier: name.to_string(),
            msg: format!("failed to serialize namespace metadata: {e}"),
        })?;

        match storage::write_new(&self.location, &layout::namespace_marker_rel_path(name), &json)
            .await
        {
            Ok(()) => {
                info!(parent: &self.span, namespace = name, "namespace created");
                Ok(())
            }
            Err(StorageError::AlreadyExists { .. }) => {
                debug!(parent: &self.span, namespace = name, "namespace already exists");
                Ok(())
            }
            Err(source) => Err(CatalogError::CatalogUnavailable { source }),
        }
    }

    /// Whether namespace `name` exists.
    pub async fn namespace_exists(&self, name: &str) -> Result<bool, CatalogError> {
        ident::validate_part(name)?;
        storage::exists(&self.location, &layout::namespace_marker_rel_path(name))
            .await
            .context(CatalogUnavailableSnafu)
    }

    /// Read the metadata of namespace `name`.
    pub async fn load_namespace(&self, name: &str) -> Result<NamespaceMeta, CatalogError> {
        ident::validate_part(name)?;
        let json =
            match storage::read_to_string(&self.location, &layout::namespace_marker_rel_path(name))
                .await
            {
                Ok(json) => json,
                Err(StorageError::NotFound { .. }) => {
                    return NamespaceNotFoundSnafu { namespace: name }.fail();
                }
                Err(source) => return Err(CatalogError::CatalogUnavailable { source }),
            };

        serde_json::from_str(&json).map_err(|e| CatalogError::CorruptState {
            identifier: name.to_string(),
            msg: format!("failed to parse namespace metadata: {e}"),
        })
    }

    /// All namespaces in the warehouse, sorted by name.
    pub async fn list_namespaces(&self) -> Result<Vec<String>, CatalogError> {
        let dirs = storage::list_dirs(&self.location, std::path::Path::new(""))
            .await
            .context(CatalogUnavailableSnafu)?;

        let mut out = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if ident::validate_part(&dir).is_err() {
                continue;
            }
            if self.namespace_exists(&dir).await? {
                out.push(dir);
            }
        }
        Ok(out)
    }

    async fn ensure_namespace(&self, name: &str) -> Result<(), CatalogError> {
        ensure!(
            self.namespace_exists(name).await?,
            NamespaceNotFoundSnafu { namespace: name }
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Tables
    // ---------------------------------------------------------------------

    /// Return the table at `ident`, creating it bound to `schema` if absent.
    ///
    /// An existing table is returned unchanged and `schema` is ignored. Of
    /// several concurrent callers racing to create the same table, exactly
    /// one creates it; the others receive the winner's table.
    pub async fn create_table_if_not_exists(
        &self,
        ident: &TableIdent,
        schema: &Schema,
    ) -> Result<Table, CatalogError> {
        self.ensure_namespace(ident.namespace()).await?;

        let log = self.log_store(ident);
        let head = log
            .load_current_version()
            .await
            .map_err(|e| CatalogError::from_commit(ident.to_string(), e))?;
        if head > 0 {
            return self.load_table(ident).await;
        }

        let logical = LogicalSchema::from_arrow(schema).context(InvalidSchemaSnafu)?;
        let meta = TableMeta::new(ident.to_string(), logical);

        match log
            .commit_with_expected_version(0, vec![LogAction::CreateTable(meta.clone())])
            .await
        {
            Ok(_) => {
                info!(
                    parent: &self.span,
                    table = %ident,
                    schema = %meta.schema,
                    "table created"
                );
                Ok(Table::new(
                    ident.clone(),
                    meta,
                    log,
                    self.commit_max_attempts,
                    self.span.clone(),
                ))
            }
            Err(e) if e.is_conflict() => {
                debug!(parent: &self.span, table = %ident, "lost table creation race; loading winner");
                self.load_table(ident).await
            }
            Err(e) => Err(CatalogError::from_commit(ident.to_string(), e)),
        }
    }

    /// Resolve `ident` to its table.
    ///
    /// Fails with [`CatalogError::NotFound`] if no table was ever created
    /// under that identifier.
    pub async fn load_table(&self, ident: &TableIdent) -> Result<Table, CatalogError> {
        let log = self.log_store(ident);
        let head = log
            .load_current_version()
            .await
            .map_err(|e| CatalogError::from_commit(ident.to_string(), e))?;
        ensure!(
            head > 0,
            NotFoundSnafu {
                identifier: ident.to_string()
            }
        );

        let meta = log
            .load_table_meta()
            .await
            .map_err(|e| CatalogError::from_commit(ident.to_string(), e))?;
        ensure!(
            meta.identifier == ident.to_string(),
            CorruptStateSnafu {
                identifier: ident.to_string(),
                msg: format!("table metadata names {}", meta.identifier),
            }
        );

        Ok(Table::new(
            ident.clone(),
            meta,
            log,
            self.commit_max_attempts,
            self.span.clone(),
        ))
    }

    /// Whether a table exists under `ident`.
    pub async fn table_exists(&self, ident: &TableIdent) -> Result<bool, CatalogError> {
        let head = self
            .log_store(ident)
            .load_current_version()
            .await
            .map_err(|e| CatalogError::from_commit(ident.to_string(), e))?;
        Ok(head > 0)
    }

    /// Names of the tables in `namespace`, sorted.
    pub async fn list_tables(&self, namespace: &str) -> Result<Vec<String>, CatalogError> {
        self.ensure_namespace(namespace).await?;

        let dirs = storage::list_dirs(&self.location, &layout::namespace_rel_dir(namespace))
            .await
            .context(CatalogUnavailableSnafu)?;

        let mut out = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let Ok(ident) = TableIdent::new(namespace, dir.as_str()) else {
                continue;
            };
            if self.table_exists(&ident).await? {
                out.push(dir);
            }
        }
        Ok(out)
    }
}
