//! Table schemas: the logical model bound at creation time and the rules an
//! incoming dataset must satisfy to be appended.
//!
//! - [`logical`] converts between Arrow schemas and the serializable
//!   [`LogicalSchema`] stored in the commit log.
//! - [`compat`] enforces "no schema evolution": same columns, same order,
//!   same types.

pub mod compat;
pub mod logical;

pub use compat::{SchemaMismatch, ensure_compatible};
pub use logical::{LogicalDataType, LogicalField, LogicalSchema, LogicalTimestampUnit};

use snafu::prelude::*;

/// Errors raised while building or converting a logical schema.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SchemaError {
    /// A schema must declare at least one column.
    #[snafu(display("Schema has no columns"))]
    NoColumns,

    /// Two columns share a name.
    #[snafu(display("Duplicate column name {column}"))]
    DuplicateColumn {
        /// The repeated column name.
        column: String,
    },

    /// The Arrow type has no logical counterpart.
    #[snafu(display("Column {column} has unsupported type {data_type}"))]
    UnsupportedType {
        /// Column (dotted path for nested fields).
        column: String,
        /// Arrow type rendered as text.
        data_type: String,
    },

    /// Fixed-size binary columns need a positive width.
    #[snafu(display("Column {column} has invalid fixed binary width {byte_width}"))]
    FixedBinaryInvalidWidth {
        /// Column (dotted path for nested fields).
        column: String,
        /// The offending width.
        byte_width: i32,
    },
}
