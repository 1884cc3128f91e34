//! Offline-readiness evaluation.

use std::collections::BTreeMap;

use microload_core::{CacheDb, ConfigRecord, Error, naming};

/// Report which of the queried logical names are cached.
///
/// Each name is resolved to its physical path under the current
/// configuration, the same derivation the populator uses, then probed
/// against the store. The report is keyed by the logical names as queried.
/// Without a current configuration nothing can be resolved and every entry
/// is false. Purely a cache-presence check; no network access.
pub async fn evaluate(
    cache: &CacheDb, required_assets: &[String], current: Option<&ConfigRecord>,
) -> Result<BTreeMap<String, bool>, Error> {
    let mut report = BTreeMap::new();
    for name in required_assets {
        let present = match current {
            Some(record) => {
                let path = format!("/{}", naming::versioned_asset_name(name, record));
                cache.contains_asset(&path).await?
            }
            None => false,
        };
        report.insert(name.clone(), present);
    }
    Ok(report)
}
