use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contents of a namespace's `_namespace.json` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMeta {
    /// Namespace name.
    pub name: String,
    /// When the namespace was first created.
    pub created_at: DateTime<Utc>,
    /// Free-form string properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl NamespaceMeta {
    /// Metadata for a namespace created now.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            properties: BTreeMap::new(),
        }
    }
}
