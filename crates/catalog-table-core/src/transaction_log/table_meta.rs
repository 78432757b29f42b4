use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::LogicalSchema;

/// Table-level metadata written by the creation commit.
///
/// Nothing in here changes after creation; in particular the schema is bound
/// for the lifetime of the table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableMeta {
    /// Qualified identifier (`<namespace>.<name>`) the table was created as.
    pub identifier: String,
    /// Random id distinguishing this physical table.
    pub table_uuid: Uuid,
    /// Schema bound at creation.
    pub schema: LogicalSchema,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Version of the on-disk format.
    pub format_version: u32,
    /// Free-form string properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl TableMeta {
    /// Current on-disk format version.
    pub const FORMAT_VERSION: u32 = 1;

    /// Metadata for a brand new table.
    pub fn new(identifier: impl Into<String>, schema: LogicalSchema) -> Self {
        Self {
            identifier: identifier.into(),
            table_uuid: Uuid::new_v4(),
            schema,
            created_at: Utc::now(),
            format_version: Self::FORMAT_VERSION,
            properties: BTreeMap::new(),
        }
    }
}
