//! Versioned asset name derivation.
//!
//! Logical names are version-independent (`app.js`); the physical path a
//! version actually serves is the stem with the version spliced in before the
//! extension (`app1.0.0.js`). The derivation is pure, so both processes can
//! compute it independently and agree.

use crate::record::ConfigRecord;

/// Entry script served by the origin; versioned with `loader_version`.
pub const LOADER_SCRIPT_NAME: &str = "loader.js";

/// The loader's base name without its extension. Request paths under this
/// prefix are always revalidated against the network.
pub fn loader_stem() -> &'static str {
    match LOADER_SCRIPT_NAME.split_once('.') {
        Some((stem, _)) => stem,
        None => LOADER_SCRIPT_NAME,
    }
}

/// Splice `version` into `name` before the last extension.
///
/// `versioned_name("app.js", "1.0.0")` is `app1.0.0.js`. Names without an
/// extension get the version appended.
pub fn versioned_name(name: &str, version: &str) -> String {
    match name.rfind('.') {
        Some(dot) => format!("{}{}{}", &name[..dot], version, &name[dot..]),
        None => format!("{name}{version}"),
    }
}

/// Physical name of an asset under a given configuration.
pub fn versioned_asset_name(name: &str, record: &ConfigRecord) -> String {
    versioned_name(name, &record.app_version)
}

/// Physical name of the loader script under a given configuration.
pub fn versioned_loader_name(record: &ConfigRecord) -> String {
    versioned_name(LOADER_SCRIPT_NAME, &record.loader_version)
}

/// Every cache path one configuration requires: the versioned loader, the
/// versioned `initial` and `runtime` assets, and the `universal` names as-is.
pub fn cache_paths(record: &ConfigRecord) -> Vec<String> {
    let mut paths = vec![format!("/{}", versioned_loader_name(record))];
    for name in record.assets.initial.iter().chain(&record.assets.runtime) {
        paths.push(format!("/{}", versioned_asset_name(name, record)));
    }
    paths.extend(record.assets.universal.iter().cloned());
    paths
}
