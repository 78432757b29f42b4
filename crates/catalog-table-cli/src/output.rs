//! Rendering datasets for `get`.

use std::io::Write;

use arrow::array::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use snafu::ResultExt;

use crate::error::{ArrowSnafu, CliResult, WriteOutputSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Csv,
    Jsonl,
}

pub fn write_dataset<W: Write>(
    batch: &RecordBatch,
    format: OutputFormat,
    out: &mut W,
) -> CliResult<()> {
    match format {
        OutputFormat::Pretty => {
            let rendered = pretty_format_batches(std::slice::from_ref(batch)).context(ArrowSnafu)?;
            writeln!(out, "{rendered}").context(WriteOutputSnafu)?;
            writeln!(out, "({} rows)", batch.num_rows()).context(WriteOutputSnafu)?;
        }
        OutputFormat::Csv => {
            let mut writer = arrow_csv::WriterBuilder::new().with_header(true).build(&mut *out);
            writer.write(batch).context(ArrowSnafu)?;
        }
        OutputFormat::Jsonl => {
            let mut writer = arrow_json::LineDelimitedWriter::new(&mut *out);
            writer.write(batch).context(ArrowSnafu)?;
            writer.finish().context(ArrowSnafu)?;
        }
    }
    out.flush().context(WriteOutputSnafu)
}
