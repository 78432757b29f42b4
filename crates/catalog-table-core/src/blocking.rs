//! Synchronous wrapper around [`CatalogFormat`].
//!
//! For callers without an async runtime. Each [`BlockingCatalogFormat`] owns
//! a current-thread Tokio runtime and drives every call to completion on the
//! calling thread. Do not call these methods from inside an async context;
//! use [`CatalogFormat`] there instead.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use arrow::array::RecordBatch;
use snafu::prelude::*;
use tokio::runtime::{Builder, Runtime};
use tracing::Span;

use crate::{
    catalog::{CatalogConfig, CatalogError, TableIdent, error::RuntimeSnafu},
    format::{CatalogFormat, Format, FormatOptions},
    table::Table,
};

fn new_runtime() -> Result<Runtime, CatalogError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .context(RuntimeSnafu)
}

/// Blocking counterpart of [`CatalogFormat`].
#[derive(Debug, Clone)]
pub struct BlockingCatalogFormat {
    runtime: Arc<Runtime>,
    inner: CatalogFormat,
}

impl BlockingCatalogFormat {
    /// Blocking [`CatalogFormat::new`].
    pub fn new(config: &CatalogConfig, options: FormatOptions) -> Result<Self, CatalogError> {
        let runtime = new_runtime()?;
        let inner = runtime.block_on(CatalogFormat::new(config, options))?;
        Ok(Self {
            runtime: Arc::new(runtime),
            inner,
        })
    }

    /// Blocking [`CatalogFormat::with_span`].
    pub fn with_span(
        config: &CatalogConfig,
        options: FormatOptions,
        span: Span,
    ) -> Result<Self, CatalogError> {
        let runtime = new_runtime()?;
        let inner = runtime.block_on(CatalogFormat::with_span(config, options, span))?;
        Ok(Self {
            runtime: Arc::new(runtime),
            inner,
        })
    }

    fn run<T, F>(&self, fut: F) -> Result<T, CatalogError>
    where
        F: Future<Output = Result<T, CatalogError>>,
    {
        self.runtime.block_on(fut)
    }

    /// Blocking [`Format::put`].
    pub fn put(&self, dataset: &RecordBatch) -> Result<Table, CatalogError> {
        self.run(self.inner.put(dataset))
    }

    /// Blocking [`Format::get`].
    pub fn get(&self) -> Result<RecordBatch, CatalogError> {
        self.run(self.inner.get())
    }

    /// Qualified identifier this adapter reads and writes.
    pub fn identifier(&self) -> &TableIdent {
        self.inner.identifier()
    }

    /// Extension metadata given at construction.
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        self.inner.metadata()
    }

    /// The async adapter this wraps.
    pub fn as_async(&self) -> &CatalogFormat {
        &self.inner
    }
}
