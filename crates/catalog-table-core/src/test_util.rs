use std::ops::Range;
use std::sync::Arc;

use arrow::array::{Array, Int32Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};

pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;

/// `(id: int32, ts: int64)`, both non-nullable.
pub(crate) fn id_ts_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("ts", DataType::Int64, false),
    ])
}

/// A single nullable string column.
pub(crate) fn name_schema() -> Schema {
    Schema::new(vec![Field::new("name", DataType::Utf8, true)])
}

/// A schema the catalog cannot bind.
pub(crate) fn unsupported_schema() -> Schema {
    Schema::new(vec![Field::new(
        "elapsed",
        DataType::Duration(TimeUnit::Second),
        false,
    )])
}

/// Rows `ids` with `ts = id * 1000`.
pub(crate) fn id_ts_batch(ids: Range<i32>) -> RecordBatch {
    let schema: SchemaRef = Arc::new(id_ts_schema());
    let ts: Vec<i64> = ids.clone().map(|id| i64::from(id) * 1000).collect();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from_iter_values(ids)),
            Arc::new(Int64Array::from(ts)),
        ],
    )
    .expect("valid batch")
}

pub(crate) fn name_batch(names: &[&str]) -> RecordBatch {
    RecordBatch::try_new(
        Arc::new(name_schema()),
        vec![Arc::new(StringArray::from(names.to_vec()))],
    )
    .expect("valid batch")
}

/// Values of the int32 column at `idx`.
pub(crate) fn i32_column(batch: &RecordBatch, idx: usize) -> Vec<i32> {
    let col = batch
        .column(idx)
        .as_any()
        .downcast_ref::<Int32Array>()
        .expect("int32 column");
    (0..col.len()).map(|i| col.value(i)).collect()
}
