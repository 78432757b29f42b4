//! The format adapter: `put`/`get` against one catalog table.
//!
//! [`CatalogFormat`] is the entry point most callers need. Constructing it
//! binds a catalog config and a table name into a fixed identifier
//! `<catalog identifier>.<name>` and makes sure the namespace exists. After
//! that:
//!
//! - [`Format::put`] creates the table on first write (binding the dataset's
//!   schema) and appends the dataset.
//! - [`Format::get`] reads the whole table back as one dataset.
//!
//! ```no_run
//! use catalog_table_core::prelude::*;
//! # async fn demo(batch: arrow::array::RecordBatch) -> Result<(), CatalogError> {
//! let config = CatalogConfig::new("ns1", "/tmp/wh");
//! let events = CatalogFormat::new(&config, FormatOptions::new("events")).await?;
//!
//! events.put(&batch).await?;
//! let all = events.get().await?;
//! # let _ = all;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use arrow::array::RecordBatch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{Span, info, info_span};

use crate::{
    catalog::{Catalog, CatalogConfig, CatalogError, TableIdent},
    table::Table,
};

/// Capability shared by table-format adapters.
#[async_trait]
pub trait Format: Send + Sync {
    /// Handle returned by [`Format::put`].
    type Handle: Send;

    /// Write `dataset`, creating the table first if it does not exist.
    async fn put(&self, dataset: &RecordBatch) -> Result<Self::Handle, CatalogError>;

    /// Read the full current contents of the table.
    async fn get(&self) -> Result<RecordBatch, CatalogError>;
}

/// Construction parameters for a format adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Table name within the catalog's namespace.
    pub name: String,
    /// Extension metadata. Stored on the adapter, never interpreted.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl FormatOptions {
    /// Options for table `name` with no metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Format adapter backed by a [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogFormat {
    catalog: Catalog,
    ident: TableIdent,
    metadata: BTreeMap<String, serde_json::Value>,
    span: Span,
}

impl CatalogFormat {
    /// Bind `options.name` inside the catalog described by `config`.
    ///
    /// Opens the catalog and creates the namespace if needed, so constructing
    /// the same adapter twice is fine. Fails with
    /// [`CatalogError::CatalogUnavailable`] if the warehouse cannot be
    /// reached and [`CatalogError::InvalidIdentifier`] for malformed names.
    pub async fn new(config: &CatalogConfig, options: FormatOptions) -> Result<Self, CatalogError> {
        let ident = TableIdent::new(config.identifier.as_str(), options.name.as_str())?;
        let span = info_span!("catalog_format", table = %ident);
        Self::bind(config, ident, options.metadata, span).await
    }

    /// Like [`CatalogFormat::new`], recording log events under `span`.
    pub async fn with_span(
        config: &CatalogConfig,
        options: FormatOptions,
        span: Span,
    ) -> Result<Self, CatalogError> {
        let ident = TableIdent::new(config.identifier.as_str(), options.name.as_str())?;
        Self::bind(config, ident, options.metadata, span).await
    }

    async fn bind(
        config: &CatalogConfig,
        ident: TableIdent,
        metadata: BTreeMap<String, serde_json::Value>,
        span: Span,
    ) -> Result<Self, CatalogError> {
        let catalog = Catalog::open_with_span(config, span.clone()).await?;
        catalog.create_namespace(ident.namespace()).await?;

        info!(
            parent: &span,
            table = %ident,
            warehouse = %catalog.location().display(),
            "format adapter bound"
        );

        Ok(Self {
            catalog,
            ident,
            metadata,
            span,
        })
    }

    /// Qualified identifier this adapter reads and writes.
    pub fn identifier(&self) -> &TableIdent {
        &self.ident
    }

    /// Catalog the adapter delegates to.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Extension metadata given at construction.
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    /// [`Format::put`], also returning the version this dataset was committed
    /// as. Other writers may have committed later versions by the time this
    /// returns.
    pub async fn put_with_version(&self, dataset: &RecordBatch) -> Result<(Table, u64), CatalogError> {
        let table = self
            .catalog
            .create_table_if_not_exists(&self.ident, dataset.schema().as_ref())
            .await?;
        let version = table.append(dataset).await?;

        info!(
            parent: &self.span,
            table = %self.ident,
            rows = dataset.num_rows(),
            version,
            "put committed"
        );
        Ok((table, version))
    }
}

#[async_trait]
impl Format for CatalogFormat {
    type Handle = Table;

    async fn put(&self, dataset: &RecordBatch) -> Result<Table, CatalogError> {
        let (table, _) = self.put_with_version(dataset).await?;
        Ok(table)
    }

    async fn get(&self) -> Result<RecordBatch, CatalogError> {
        let table = self.catalog.load_table(&self.ident).await?;
        let scan = table.scan().await?;
        let version = scan.version();
        let dataset = scan.to_dataset().await?;

        info!(
            parent: &self.span,
            table = %self.ident,
            rows = dataset.num_rows(),
            version,
            "get materialized"
        );
        Ok(dataset)
    }
}
