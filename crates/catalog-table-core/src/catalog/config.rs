use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::error::{CatalogError, InvalidConfigSnafu};

/// Connection details for a catalog.
///
/// ```json
/// { "identifier": "ns1", "warehouse_path": "/tmp/wh", "commit.max-attempts": "20" }
/// ```
///
/// Keys other than `identifier` and `warehouse_path` are collected into
/// `properties`. Property values may be JSON strings, numbers or booleans;
/// they are stored as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalogConfig")]
pub struct CatalogConfig {
    /// Catalog identifier, used as the namespace tables are created in.
    pub identifier: String,
    /// Root directory of the warehouse.
    pub warehouse_path: PathBuf,
    /// Additional string properties.
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawCatalogConfig {
    identifier: String,
    warehouse_path: PathBuf,
    #[serde(flatten)]
    properties: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawCatalogConfig> for CatalogConfig {
    type Error = String;

    fn try_from(raw: RawCatalogConfig) -> Result<Self, Self::Error> {
        let mut properties = BTreeMap::new();
        for (key, value) in raw.properties {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(format!(
                        "property {key:?} must be a string, number or boolean, got {other}"
                    ));
                }
            };
            properties.insert(key, value);
        }

        Ok(Self {
            identifier: raw.identifier,
            warehouse_path: raw.warehouse_path,
            properties,
        })
    }
}

impl CatalogConfig {
    /// Property bounding how many times an append retries its commit.
    pub const COMMIT_MAX_ATTEMPTS: &'static str = "commit.max-attempts";

    /// Default for [`Self::COMMIT_MAX_ATTEMPTS`].
    pub const DEFAULT_COMMIT_MAX_ATTEMPTS: u32 = 100;

    /// Config with no extra properties.
    pub fn new(identifier: impl Into<String>, warehouse_path: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            warehouse_path: warehouse_path.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Set a property, returning the updated config.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Maximum commit attempts per append.
    pub fn commit_max_attempts(&self) -> Result<u32, CatalogError> {
        let key = Self::COMMIT_MAX_ATTEMPTS;
        let Some(raw) = self.properties.get(key) else {
            return Ok(Self::DEFAULT_COMMIT_MAX_ATTEMPTS);
        };

        match raw.trim().parse::<u32>() {
            Ok(0) => InvalidConfigSnafu {
                key,
                value: raw.clone(),
                reason: "must be at least 1",
            }
            .fail(),
            Ok(n) => Ok(n),
            Err(e) => InvalidConfigSnafu {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }
            .fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_become_properties() -> Result<(), serde_json::Error> {
        let json = r#"{
            "identifier": "ns1",
            "warehouse_path": "/tmp/wh",
            "commit.max-attempts": "7",
            "owner": "data-team"
        }"#;
        let config: CatalogConfig = serde_json::from_str(json)?;

        assert_eq!(config.identifier, "ns1");
        assert_eq!(config.warehouse_path, PathBuf::from("/tmp/wh"));
        assert_eq!(config.properties.get("owner").map(String::as_str), Some("data-team"));
        assert_eq!(config.commit_max_attempts().ok(), Some(7));
        Ok(())
    }

    #[test]
    fn scalar_property_values_are_stored_as_strings() -> Result<(), serde_json::Error> {
        let json = r#"{
            "identifier": "ns1",
            "warehouse_path": "/tmp/wh",
            "commit.max-attempts": 20,
            "audit": true
        }"#;
        let config: CatalogConfig = serde_json::from_str(json)?;

        assert_eq!(config.commit_max_attempts().ok(), Some(20));
        assert_eq!(config.properties.get("audit").map(String::as_str), Some("true"));
        Ok(())
    }

    #[test]
    fn nested_property_values_are_rejected() {
        let json = r#"{ "identifier": "ns1", "warehouse_path": "/tmp/wh", "owner": {"team": "x"} }"#;
        let err = serde_json::from_str::<CatalogConfig>(json).expect_err("object value");
        assert!(err.to_string().contains("\"owner\""));
    }

    #[test]
    fn config_roundtrips_through_json() -> Result<(), serde_json::Error> {
        let config = CatalogConfig::new("ns1", "/tmp/wh").with_property("owner", "data-team");
        let decoded: CatalogConfig = serde_json::from_str(&serde_json::to_string(&config)?)?;
        assert_eq!(decoded, config);
        Ok(())
    }

    #[test]
    fn commit_max_attempts_defaults_and_validates() {
        let config = CatalogConfig::new("ns1", "/tmp/wh");
        assert_eq!(
            config.commit_max_attempts().ok(),
            Some(CatalogConfig::DEFAULT_COMMIT_MAX_ATTEMPTS)
        );

        for bad in ["0", "-1", "lots"] {
            let config = CatalogConfig::new("ns1", "/tmp/wh")
                .with_property(CatalogConfig::COMMIT_MAX_ATTEMPTS, bad);
            assert!(matches!(
                config.commit_max_attempts(),
                Err(CatalogError::InvalidConfig { .. })
            ));
        }
    }
}
