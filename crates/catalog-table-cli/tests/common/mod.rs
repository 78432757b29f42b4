#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Int32Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn write_batch(path: &Path, batch: &RecordBatch) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// `id: int32, ts: int64` rows with `ts = id * 1000`.
pub fn write_id_ts_parquet(path: &Path, ids: std::ops::Range<i32>) -> TestResult {
    let mut id_builder = Int32Builder::new();
    let mut ts_builder = Int64Builder::new();
    for id in ids {
        id_builder.append_value(id);
        ts_builder.append_value(i64::from(id) * 1_000);
    }

    let schema = Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("ts", DataType::Int64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(id_builder.finish()) as _,
            Arc::new(ts_builder.finish()),
        ],
    )?;
    write_batch(path, &batch)
}

pub fn write_name_parquet(path: &Path, names: &[&str]) -> TestResult {
    let mut builder = StringBuilder::new();
    for name in names {
        builder.append_value(name);
    }
    let schema = Schema::new(vec![Field::new("name", DataType::Utf8, false)]);
    let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(builder.finish()) as _])?;
    write_batch(path, &batch)
}

/// Write `catalog.json` for catalog `identifier` with the warehouse under `tmp`.
pub fn write_config(tmp: &TempDir, identifier: &str) -> TestResult<PathBuf> {
    let config = serde_json::json!({
        "identifier": identifier,
        "warehouse_path": tmp.path().join("warehouse"),
    });
    let path = tmp.path().join("catalog.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&config)?)?;
    Ok(path)
}
