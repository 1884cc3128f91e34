//! Per-process registry of configuration versions.

use std::collections::BTreeMap;

use crate::record::ConfigRecord;

/// Mapping from `app_version` to its configuration record, plus the version
/// the process currently treats as authoritative.
///
/// One registry exists per process for the process lifetime. Records are
/// immutable once imported: importing a version that is already present keeps
/// the first record (first writer wins). `current_version`, when set, always
/// keys an entry in the map.
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    configs: BTreeMap<String, ConfigRecord>,
    current_version: Option<String>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record under its version key if absent, and elect it as current
    /// when the registry has no current version yet or `make_current` is set.
    ///
    /// Returns true when the current version changed.
    pub fn import(&mut self, record: ConfigRecord, make_current: bool) -> bool {
        let version = record.app_version.clone();
        self.configs.entry(version.clone()).or_insert(record);

        if self.current_version.is_none() || make_current {
            let changed = self.current_version.as_deref() != Some(version.as_str());
            self.current_version = Some(version);
            changed
        } else {
            false
        }
    }

    /// Reassign the current version to an already-imported record.
    ///
    /// Unknown versions leave the registry unchanged and are logged.
    pub fn elect(&mut self, version: &str) -> bool {
        if self.configs.contains_key(version) {
            self.current_version = Some(version.to_string());
            true
        } else {
            tracing::warn!(version, "cannot elect unknown version");
            false
        }
    }

    pub fn current(&self) -> Option<&ConfigRecord> {
        self.current_version.as_ref().and_then(|v| self.configs.get(v))
    }

    pub fn current_version(&self) -> Option<&str> {
        self.current_version.as_deref()
    }

    pub fn contains(&self, version: &str) -> bool {
        self.configs.contains_key(version)
    }

    pub fn get(&self, version: &str) -> Option<&ConfigRecord> {
        self.configs.get(version)
    }

    /// All imported records, in version-key order.
    pub fn records(&self) -> impl Iterator<Item = &ConfigRecord> {
        self.configs.values()
    }

    /// The full version-to-record map, as pushed and pulled on the wire.
    pub fn configs(&self) -> &BTreeMap<String, ConfigRecord> {
        &self.configs
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
