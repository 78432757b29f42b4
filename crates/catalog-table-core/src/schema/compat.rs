//! Append-time schema compatibility.
//!
//! A table's schema never changes after creation. An incoming dataset is
//! compatible when it has the same number of columns, the same names in the
//! same order, and identical logical types. Nullability is deliberately not
//! part of this check: a nullable incoming column may still be written into a
//! non-nullable table column as long as it holds no nulls, which is verified
//! against the data when the batch is rebound to the table schema.
//!
//! The relaxation applies to top-level columns only. Child fields of struct
//! and list columns are part of the column's [`LogicalDataType`], so their
//! nullability must match the table exactly. Arrow compares nested field
//! nullability when a batch is rebound, so a looser check here could not be
//! honored anyway.

use snafu::prelude::*;

use super::{LogicalDataType, LogicalSchema};

/// Ways an incoming schema can disagree with a table's bound schema.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum SchemaMismatch {
    /// Different number of columns.
    #[snafu(display("expected {expected} columns, dataset has {found}"))]
    ColumnCount {
        /// Columns in the table schema.
        expected: usize,
        /// Columns in the dataset.
        found: usize,
    },

    /// Column names differ at some position.
    #[snafu(display("column {position} is {found:?}, table expects {expected:?}"))]
    ColumnName {
        /// Zero-based column position.
        position: usize,
        /// Name in the table schema.
        expected: String,
        /// Name in the dataset.
        found: String,
    },

    /// Same column, different type.
    #[snafu(display("column {column} has type {found}, table expects {expected}"))]
    ColumnType {
        /// Column name.
        column: String,
        /// Type in the table schema.
        expected: LogicalDataType,
        /// Type in the dataset.
        found: LogicalDataType,
    },

    /// The data violates a constraint of the bound schema (for example,
    /// nulls in a non-nullable column).
    #[snafu(display("dataset does not fit the table schema: {message}"))]
    Data {
        /// Description from the Arrow validation.
        message: String,
    },
}

/// Check that `incoming` can be appended to a table bound to `table`.
pub fn ensure_compatible(
    table: &LogicalSchema,
    incoming: &LogicalSchema,
) -> Result<(), SchemaMismatch> {
    ensure!(
        table.len() == incoming.len(),
        ColumnCountSnafu {
            expected: table.len(),
            found: incoming.len(),
        }
    );

    for (position, (tcol, icol)) in table.columns().iter().zip(incoming.columns()).enumerate() {
        ensure!(
            tcol.name == icol.name,
            ColumnNameSnafu {
                position,
                expected: tcol.name.clone(),
                found: icol.name.clone(),
            }
        );
        ensure!(
            tcol.data_type == icol.data_type,
            ColumnTypeSnafu {
                column: tcol.name.clone(),
                expected: tcol.data_type.clone(),
                found: icol.data_type.clone(),
            }
        );
    }

    Ok(())
}
