//! Logical schema model persisted in the commit log.
//!
//! A [`LogicalSchema`] is the serializable, engine-neutral description of a
//! table's columns. It is derived from the Arrow schema of the first dataset
//! written to a table and converted back to Arrow whenever batches are
//! validated or materialized.
use std::{collections::HashSet, fmt, sync::Arc};

use arrow::datatypes::{DataType, Field, FieldRef, Fields, Schema, SchemaRef, TimeUnit};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use super::{
    DuplicateColumnSnafu, FixedBinaryInvalidWidthSnafu, NoColumnsSnafu, SchemaError,
    UnsupportedTypeSnafu,
};

/// Units for logical timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicalTimestampUnit {
    /// Second precision.
    Seconds,
    /// Millisecond precision.
    Millis,
    /// Microsecond precision.
    Micros,
    /// Nanosecond precision.
    Nanos,
}

impl LogicalTimestampUnit {
    fn to_arrow(self) -> TimeUnit {
        match self {
            LogicalTimestampUnit::Seconds => TimeUnit::Second,
            LogicalTimestampUnit::Millis => TimeUnit::Millisecond,
            LogicalTimestampUnit::Micros => TimeUnit::Microsecond,
            LogicalTimestampUnit::Nanos => TimeUnit::Nanosecond,
        }
    }

    fn from_arrow(unit: &TimeUnit) -> Self {
        match unit {
            TimeUnit::Second => LogicalTimestampUnit::Seconds,
            TimeUnit::Millisecond => LogicalTimestampUnit::Millis,
            TimeUnit::Microsecond => LogicalTimestampUnit::Micros,
            TimeUnit::Nanosecond => LogicalTimestampUnit::Nanos,
        }
    }
}

impl fmt::Display for LogicalTimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalTimestampUnit::Seconds => write!(f, "s"),
            LogicalTimestampUnit::Millis => write!(f, "ms"),
            LogicalTimestampUnit::Micros => write!(f, "us"),
            LogicalTimestampUnit::Nanos => write!(f, "ns"),
        }
    }
}

/// Logical column definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogicalField {
    /// Column name.
    pub name: String,
    /// Logical data type for the column.
    pub data_type: LogicalDataType,
    /// Whether the column allows null values.
    #[serde(default)]
    pub nullable: bool,
}

impl LogicalField {
    /// Build a field from an Arrow field, failing on unsupported types.
    pub fn from_arrow(field: &Field) -> Result<Self, SchemaError> {
        Ok(LogicalField {
            name: field.name().clone(),
            data_type: LogicalDataType::from_arrow(field.name(), field.data_type())?,
            nullable: field.is_nullable(),
        })
    }

    fn to_arrow_field_ref(&self) -> FieldRef {
        Arc::new(Field::new(
            self.name.clone(),
            self.data_type.to_arrow(),
            self.nullable,
        ))
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?: {}", self.name, self.data_type)
        } else {
            write!(f, "{}: {}", self.name, self.data_type)
        }
    }
}

/// Logical data types a table column may have.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicalDataType {
    /// Boolean value.
    Bool,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string with 32-bit offsets.
    Utf8,
    /// UTF-8 string with 64-bit offsets.
    LargeUtf8,
    /// Variable-length binary with 32-bit offsets.
    Binary,
    /// Variable-length binary with 64-bit offsets.
    LargeBinary,
    /// Fixed-length binary data.
    FixedBinary {
        /// Byte width of each value.
        byte_width: i32,
    },
    /// Days since the UNIX epoch.
    Date32,
    /// Milliseconds since the UNIX epoch.
    Date64,
    /// Timestamp with a precision unit and optional timezone.
    Timestamp {
        /// Timestamp precision unit.
        unit: LogicalTimestampUnit,
        /// Optional timezone identifier.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timezone: Option<String>,
    },
    /// 128-bit decimal.
    Decimal128 {
        /// Total number of digits.
        precision: u8,
        /// Digits right of the decimal point.
        scale: i8,
    },
    /// 256-bit decimal.
    Decimal256 {
        /// Total number of digits.
        precision: u8,
        /// Digits right of the decimal point.
        scale: i8,
    },
    /// Struct with named child fields.
    Struct {
        /// Ordered child fields.
        fields: Vec<LogicalField>,
    },
    /// List with a single element field.
    List {
        /// Element field definition.
        elements: Box<LogicalField>,
    },
}

impl LogicalDataType {
    /// Map an Arrow type onto the logical model. `column` names the column
    /// (dotted for nested fields) in error messages.
    pub fn from_arrow(column: &str, data_type: &DataType) -> Result<Self, SchemaError> {
        Ok(match data_type {
            DataType::Boolean => LogicalDataType::Bool,
            DataType::Int8 => LogicalDataType::Int8,
            DataType::Int16 => LogicalDataType::Int16,
            DataType::Int32 => LogicalDataType::Int32,
            DataType::Int64 => LogicalDataType::Int64,
            DataType::UInt8 => LogicalDataType::UInt8,
            DataType::UInt16 => LogicalDataType::UInt16,
            DataType::UInt32 => LogicalDataType::UInt32,
            DataType::UInt64 => LogicalDataType::UInt64,
            DataType::Float32 => LogicalDataType::Float32,
            DataType::Float64 => LogicalDataType::Float64,
            DataType::Utf8 => LogicalDataType::Utf8,
            DataType::LargeUtf8 => LogicalDataType::LargeUtf8,
            DataType::Binary => LogicalDataType::Binary,
            DataType::LargeBinary => LogicalDataType::LargeBinary,
            DataType::FixedSizeBinary(byte_width) => {
                ensure!(
                    *byte_width > 0,
                    FixedBinaryInvalidWidthSnafu {
                        column,
                        byte_width: *byte_width,
                    }
                );
                LogicalDataType::FixedBinary {
                    byte_width: *byte_width,
                }
            }
            DataType::Date32 => LogicalDataType::Date32,
            DataType::Date64 => LogicalDataType::Date64,
            DataType::Timestamp(unit, tz) => LogicalDataType::Timestamp {
                unit: LogicalTimestampUnit::from_arrow(unit),
                timezone: tz.as_ref().map(|tz| tz.to_string()),
            },
            DataType::Decimal128(precision, scale) => LogicalDataType::Decimal128 {
                precision: *precision,
                scale: *scale,
            },
            DataType::Decimal256(precision, scale) => LogicalDataType::Decimal256 {
                precision: *precision,
                scale: *scale,
            },
            DataType::Struct(children) => {
                let mut fields = Vec::with_capacity(children.len());
                for child in children {
                    let path = format!("{column}.{}", child.name());
                    fields.push(LogicalField {
                        name: child.name().clone(),
                        data_type: LogicalDataType::from_arrow(&path, child.data_type())?,
                        nullable: child.is_nullable(),
                    });
                }
                LogicalDataType::Struct { fields }
            }
            DataType::List(element) => {
                let path = format!("{column}.{}", element.name());
                LogicalDataType::List {
                    elements: Box::new(LogicalField {
                        name: element.name().clone(),
                        data_type: LogicalDataType::from_arrow(&path, element.data_type())?,
                        nullable: element.is_nullable(),
                    }),
                }
            }
            other => {
                return UnsupportedTypeSnafu {
                    column,
                    data_type: other.to_string(),
                }
                .fail();
            }
        })
    }

    /// The Arrow type this logical type materializes as.
    pub fn to_arrow(&self) -> DataType {
        match self {
            LogicalDataType::Bool => DataType::Boolean,
            LogicalDataType::Int8 => DataType::Int8,
            LogicalDataType::Int16 => DataType::Int16,
            LogicalDataType::Int32 => DataType::Int32,
            LogicalDataType::Int64 => DataType::Int64,
            LogicalDataType::UInt8 => DataType::UInt8,
            LogicalDataType::UInt16 => DataType::UInt16,
            LogicalDataType::UInt32 => DataType::UInt32,
            LogicalDataType::UInt64 => DataType::UInt64,
            LogicalDataType::Float32 => DataType::Float32,
            LogicalDataType::Float64 => DataType::Float64,
            LogicalDataType::Utf8 => DataType::Utf8,
            LogicalDataType::LargeUtf8 => DataType::LargeUtf8,
            LogicalDataType::Binary => DataType::Binary,
            LogicalDataType::LargeBinary => DataType::LargeBinary,
            LogicalDataType::FixedBinary { byte_width } => DataType::FixedSizeBinary(*byte_width),
            LogicalDataType::Date32 => DataType::Date32,
            LogicalDataType::Date64 => DataType::Date64,
            LogicalDataType::Timestamp { unit, timezone } => {
                let tz: Option<Arc<str>> = timezone.as_deref().map(Arc::from);
                DataType::Timestamp(unit.to_arrow(), tz)
            }
            LogicalDataType::Decimal128 { precision, scale } => {
                DataType::Decimal128(*precision, *scale)
            }
            LogicalDataType::Decimal256 { precision, scale } => {
                DataType::Decimal256(*precision, *scale)
            }
            LogicalDataType::Struct { fields } => DataType::Struct(Fields::from(
                fields
                    .iter()
                    .map(LogicalField::to_arrow_field_ref)
                    .collect::<Vec<_>>(),
            )),
            LogicalDataType::List { elements } => DataType::List(elements.to_arrow_field_ref()),
        }
    }
}

impl fmt::Display for LogicalDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalDataType::Bool => write!(f, "bool"),
            LogicalDataType::Int8 => write!(f, "int8"),
            LogicalDataType::Int16 => write!(f, "int16"),
            LogicalDataType::Int32 => write!(f, "int32"),
            LogicalDataType::Int64 => write!(f, "int64"),
            LogicalDataType::UInt8 => write!(f, "uint8"),
            LogicalDataType::UInt16 => write!(f, "uint16"),
            LogicalDataType::UInt32 => write!(f, "uint32"),
            LogicalDataType::UInt64 => write!(f, "uint64"),
            LogicalDataType::Float32 => write!(f, "float32"),
            LogicalDataType::Float64 => write!(f, "float64"),
            LogicalDataType::Utf8 => write!(f, "utf8"),
            LogicalDataType::LargeUtf8 => write!(f, "large_utf8"),
            LogicalDataType::Binary => write!(f, "binary"),
            LogicalDataType::LargeBinary => write!(f, "large_binary"),
            LogicalDataType::FixedBinary { byte_width } => write!(f, "fixed_binary[{byte_width}]"),
            LogicalDataType::Date32 => write!(f, "date32"),
            LogicalDataType::Date64 => write!(f, "date64"),
            LogicalDataType::Timestamp { unit, timezone } => match timezone {
                Some(tz) => write!(f, "timestamp[{unit}]({tz})"),
                None => write!(f, "timestamp[{unit}]"),
            },
            LogicalDataType::Decimal128 { precision, scale }
            | LogicalDataType::Decimal256 { precision, scale } => {
                write!(f, "decimal({precision}, {scale})")
            }
            LogicalDataType::Struct { fields } => {
                write!(f, "struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, ">")
            }
            LogicalDataType::List { elements } => write!(f, "list<{elements}>"),
        }
    }
}

/// Ordered, uniquely named column definitions bound to a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<LogicalField>", into = "Vec<LogicalField>")]
pub struct LogicalSchema {
    columns: Vec<LogicalField>,
}

impl LogicalSchema {
    /// Build a schema, rejecting empty column lists and duplicate names.
    pub fn new(columns: Vec<LogicalField>) -> Result<Self, SchemaError> {
        ensure!(!columns.is_empty(), NoColumnsSnafu);

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            ensure!(
                seen.insert(col.name.as_str()),
                DuplicateColumnSnafu {
                    column: col.name.clone(),
                }
            );
        }
        Ok(Self { columns })
    }

    /// Derive a logical schema from an Arrow schema.
    pub fn from_arrow(schema: &Schema) -> Result<Self, SchemaError> {
        let columns = schema
            .fields()
            .iter()
            .map(|f| LogicalField::from_arrow(f))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(columns)
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[LogicalField] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; a schema has at least one column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The Arrow schema batches of this table are materialized with.
    pub fn to_arrow_schema(&self) -> SchemaRef {
        Arc::new(Schema::new(
            self.columns
                .iter()
                .map(LogicalField::to_arrow_field_ref)
                .collect::<Vec<_>>(),
        ))
    }
}

impl TryFrom<Vec<LogicalField>> for LogicalSchema {
    type Error = SchemaError;

    fn try_from(columns: Vec<LogicalField>) -> Result<Self, Self::Error> {
        LogicalSchema::new(columns)
    }
}

impl From<LogicalSchema> for Vec<LogicalField> {
    fn from(schema: LogicalSchema) -> Self {
        schema.columns
    }
}

impl fmt::Display for LogicalSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{col}")?;
        }
        write!(f, ")")
    }
}
