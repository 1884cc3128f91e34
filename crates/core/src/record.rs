//! Configuration records describing one deployed application version.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Logical asset names carried by a configuration, split by load phase.
///
/// Names in `initial` and `runtime` are version-independent; the physical
/// path actually fetched is derived from the owning record's version.
/// `universal` names are served as-is for every version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Assets that must load at startup.
    #[serde(default)]
    pub initial: Vec<String>,

    /// Assets that may be loaded lazily later.
    #[serde(default)]
    pub runtime: Vec<String>,

    /// Version-independent assets, cached under their unversioned names.
    #[serde(default)]
    pub universal: Vec<String>,
}

/// One immutable configuration record, keyed by `app_version` in the registry.
///
/// The serialized shape doubles as the bundled JSON config file format:
/// `{loader_version, app_version, assets: {initial, runtime, universal}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub app_version: String,
    pub loader_version: String,
    #[serde(default)]
    pub assets: AssetManifest,
}

impl ConfigRecord {
    /// Load a bundled configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigRead` if the file cannot be read and
    /// `Error::ConfigParse` if it is not a valid record.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead { path: path.into(), source })?;
        serde_json::from_str(&raw).map_err(|source| Error::ConfigParse { path: path.into(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_file_shape() {
        let raw = r#"{
            "loader_version": "1.0.2",
            "app_version": "1.0.0",
            "assets": {
                "initial": ["app.js"],
                "runtime": ["extra.js"],
                "universal": ["favicon.ico"]
            }
        }"#;
        let record: ConfigRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.app_version, "1.0.0");
        assert_eq!(record.loader_version, "1.0.2");
        assert_eq!(record.assets.initial, vec!["app.js"]);
        assert_eq!(record.assets.runtime, vec!["extra.js"]);
        assert_eq!(record.assets.universal, vec!["favicon.ico"]);
    }

    #[test]
    fn test_parse_missing_asset_lists_default_empty() {
        let raw = r#"{"loader_version": "1", "app_version": "2", "assets": {}}"#;
        let record: ConfigRecord = serde_json::from_str(raw).unwrap();
        assert!(record.assets.initial.is_empty());
        assert!(record.assets.runtime.is_empty());
        assert!(record.assets.universal.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigRecord::load("./no-such-config.json");
        assert!(matches!(result, Err(Error::ConfigRead { .. })));
    }
}
