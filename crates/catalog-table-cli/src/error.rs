use std::path::PathBuf;

use catalog_table_core::catalog::CatalogError;
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Config file not found or not readable: {}", path.display()))]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Config file {} is not a valid catalog config: {source}", path.display()))]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Parquet file not found or not readable: {}", path.display()))]
    ReadParquet {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to decode parquet file {}: {source}", path.display()))]
    DecodeParquet {
        path: PathBuf,
        source: parquet::errors::ParquetError,
    },

    #[snafu(display("Arrow error: {source}"))]
    Arrow {
        source: arrow::error::ArrowError,
    },

    #[snafu(display("Parquet file {} has no columns", path.display()))]
    EmptyParquet { path: PathBuf },

    #[snafu(display("{source}"))]
    Catalog {
        #[snafu(source(from(CatalogError, Box::new)))]
        source: Box<CatalogError>,
    },

    #[snafu(display("Failed to write output: {source}"))]
    WriteOutput { source: std::io::Error },

    #[snafu(display("Failed to create output file {}: {source}", path.display()))]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}
