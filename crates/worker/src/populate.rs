//! Cache population from configuration records.
//!
//! Every configuration-save pass re-derives the full set of cache paths from
//! every version the worker has ever merged, not just the current one, so
//! assets of superseded versions stay cached and an offline rollback to an
//! older version keeps working.

use std::collections::BTreeSet;
use std::sync::Arc;

use microload_core::{AssetEntry, CacheDb, VersionRegistry, naming};

use crate::fetch::AssetFetcher;

/// The deduplicated union of cache paths over every imported configuration.
pub fn required_paths(registry: &VersionRegistry) -> Vec<String> {
    let paths: BTreeSet<String> = registry.records().flat_map(naming::cache_paths).collect();
    paths.into_iter().collect()
}

/// Fetch and store every given path.
///
/// Failures are isolated per path: a fetch or store error is logged and the
/// rest of the batch continues. Nothing is reported back to the client; the
/// readiness query is the only signal of partial population.
pub async fn populate(cache: CacheDb, fetcher: Arc<dyn AssetFetcher>, paths: Vec<String>) {
    let total = paths.len();
    let mut stored = 0usize;

    for path in paths {
        match fetcher.fetch(&path).await {
            Ok(asset) => {
                let entry = AssetEntry {
                    path: path.clone(),
                    body: asset.body.to_vec(),
                    content_type: asset.content_type,
                    fetched_at: chrono::Utc::now().to_rfc3339(),
                };
                match cache.put_asset(&entry).await {
                    Ok(()) => stored += 1,
                    Err(err) => tracing::warn!(path = %path, %err, "failed to store fetched asset"),
                }
            }
            Err(err) => tracing::warn!(path = %path, %err, "failed to fetch asset for caching"),
        }
    }

    tracing::info!(stored, total, "cache population pass complete");
}
