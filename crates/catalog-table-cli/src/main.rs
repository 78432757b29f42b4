//! CLI tool for loading Parquet files into catalog tables and reading them back.
//!
//! Every command takes `--config <file.json>` holding a catalog config:
//!
//! ```json
//! { "identifier": "ns1", "warehouse_path": "/data/wh" }
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

mod error;
mod output;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use bytes::Bytes;
use catalog_table_core::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use snafu::prelude::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::{
    ArrowSnafu, CatalogSnafu, CliResult, CreateOutputSnafu, DecodeParquetSnafu, EmptyParquetSnafu,
    ParseConfigSnafu, ReadConfigSnafu, ReadParquetSnafu, WriteOutputSnafu,
};
use crate::output::{OutputFormat, write_dataset};

#[derive(Parser, Debug)]
#[command(name = "catalog-table")]
#[command(about = "Catalog-managed, append-only tables", long_about = None)]
struct Cli {
    /// Path to the catalog config (JSON).
    #[arg(long, global = true, default_value = "catalog.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append a Parquet file to a table, creating the table on first use.
    Put {
        /// Table name inside the catalog's namespace.
        #[arg(long)]
        table: String,

        /// Parquet file to load.
        #[arg(long)]
        parquet: PathBuf,
    },

    /// Print the full contents of a table.
    Get {
        /// Table name inside the catalog's namespace.
        #[arg(long)]
        table: String,

        #[arg(long, value_enum, default_value_t = CliFormat::Pretty)]
        format: CliFormat,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List namespaces in the warehouse.
    Namespaces,

    /// List tables in a namespace.
    Tables {
        /// Defaults to the catalog identifier.
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Show the commit history of a table.
    History {
        #[arg(long)]
        table: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliFormat {
    Pretty,
    Csv,
    Jsonl,
}

impl From<CliFormat> for OutputFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Pretty => OutputFormat::Pretty,
            CliFormat::Csv => OutputFormat::Csv,
            CliFormat::Jsonl => OutputFormat::Jsonl,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded; ignore that.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(path: &Path) -> CliResult<CatalogConfig> {
    let raw = std::fs::read_to_string(path).context(ReadConfigSnafu { path })?;
    serde_json::from_str(&raw).context(ParseConfigSnafu { path })
}

fn read_parquet(path: &Path) -> CliResult<RecordBatch> {
    let bytes = Bytes::from(std::fs::read(path).context(ReadParquetSnafu { path })?);
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).context(DecodeParquetSnafu { path })?;
    let schema = builder.schema().clone();
    let reader = builder.build().context(DecodeParquetSnafu { path })?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context(ArrowSnafu)?;
    if batches.is_empty() && schema.fields().is_empty() {
        return EmptyParquetSnafu { path }.fail();
    }
    let dataset = concat_batches(&schema, &batches).context(ArrowSnafu)?;
    debug!(
        path = %path.display(),
        batches = batches.len(),
        rows = dataset.num_rows(),
        "read parquet input"
    );
    Ok(dataset)
}

async fn cmd_put(config: &CatalogConfig, table: String, parquet: &Path) -> CliResult<()> {
    let dataset = read_parquet(parquet)?;
    let format = CatalogFormat::new(config, FormatOptions::new(table))
        .await
        .context(CatalogSnafu)?;
    let (_, version) = format
        .put_with_version(&dataset)
        .await
        .context(CatalogSnafu)?;

    println!(
        "Appended {} rows to {} (version {version})",
        dataset.num_rows(),
        format.identifier()
    );
    Ok(())
}

async fn cmd_get(
    config: &CatalogConfig,
    table: String,
    format: CliFormat,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let adapter = CatalogFormat::new(config, FormatOptions::new(table))
        .await
        .context(CatalogSnafu)?;
    let dataset = adapter.get().await.context(CatalogSnafu)?;

    match output {
        Some(path) => {
            let file = File::create(&path).context(CreateOutputSnafu { path: path.clone() })?;
            let mut out = BufWriter::new(file);
            write_dataset(&dataset, format.into(), &mut out)?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_dataset(&dataset, format.into(), &mut out)?;
        }
    }
    Ok(())
}

async fn cmd_namespaces(config: &CatalogConfig) -> CliResult<()> {
    let catalog = Catalog::open(config).await.context(CatalogSnafu)?;
    let namespaces = catalog.list_namespaces().await.context(CatalogSnafu)?;
    let mut out = io::stdout().lock();
    for ns in namespaces {
        writeln!(out, "{ns}").context(WriteOutputSnafu)?;
    }
    Ok(())
}

async fn cmd_tables(config: &CatalogConfig, namespace: Option<String>) -> CliResult<()> {
    let catalog = Catalog::open(config).await.context(CatalogSnafu)?;
    let namespace = namespace.unwrap_or_else(|| config.identifier.clone());
    let tables = catalog.list_tables(&namespace).await.context(CatalogSnafu)?;
    let mut out = io::stdout().lock();
    for name in tables {
        writeln!(out, "{namespace}.{name}").context(WriteOutputSnafu)?;
    }
    Ok(())
}

async fn cmd_history(config: &CatalogConfig, table: String) -> CliResult<()> {
    let catalog = Catalog::open(config).await.context(CatalogSnafu)?;
    let ident = TableIdent::new(config.identifier.as_str(), table.as_str()).context(CatalogSnafu)?;
    let handle = catalog.load_table(&ident).await.context(CatalogSnafu)?;
    let history = handle.history().await.context(CatalogSnafu)?;

    let mut out = io::stdout().lock();
    writeln!(out, "version\ttimestamp\taction\trows").context(WriteOutputSnafu)?;
    for commit in history {
        let action = if commit.created_table { "create" } else { "append" };
        writeln!(
            out,
            "{}\t{}\t{action}\t{}",
            commit.version,
            commit.timestamp.to_rfc3339(),
            commit.rows_added
        )
        .context(WriteOutputSnafu)?;
    }
    Ok(())
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Put { table, parquet } => cmd_put(&config, table, &parquet).await,
        Command::Get {
            table,
            format,
            output,
        } => cmd_get(&config, table, format, output).await,
        Command::Namespaces => cmd_namespaces(&config).await,
        Command::Tables { namespace } => cmd_tables(&config, namespace).await,
        Command::History { table } => cmd_history(&config, table).await,
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
