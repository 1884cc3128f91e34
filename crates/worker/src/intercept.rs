//! Request interception strategies.
//!
//! The loader entry route must reflect the newest deployed version whenever
//! connectivity exists, so new sessions bootstrap the latest configuration;
//! versioned asset paths are immutable per version and safe to serve from
//! cache unconditionally once cached. Hence the asymmetry: the root path and
//! anything under the loader's base name revalidate against the network
//! first, everything else is served cache-first.

use std::sync::Arc;

use microload_core::{CacheDb, Error, naming};

use crate::fetch::{AssetFetcher, FetchError};

/// Fetch strategy for one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
}

impl Strategy {
    /// Classify a request path.
    pub fn classify(path: &str) -> Strategy {
        let loader_prefix = format!("/{}", naming::loader_stem());
        if path == "/" || path.starts_with(&loader_prefix) {
            Strategy::NetworkFirst
        } else {
            Strategy::CacheFirst
        }
    }
}

/// Where an intercepted request was ultimately served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
}

/// A successfully served response.
#[derive(Debug, Clone)]
pub struct ServedAsset {
    pub path: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub source: ServedFrom,
}

/// Error type for interception failures.
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    /// Neither the cache nor the network could serve the path. Propagated to
    /// whatever issued the original request.
    #[error("cannot serve {path}: not cached and fetch failed: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: FetchError,
    },

    /// The cache store itself failed.
    #[error(transparent)]
    Store(#[from] Error),
}

/// Serves every resource request routed through the worker.
pub struct Interceptor {
    cache: CacheDb,
    fetcher: Arc<dyn AssetFetcher>,
}

impl Interceptor {
    pub fn new(cache: CacheDb, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// Serve one request path according to its strategy.
    pub async fn handle(&self, path: &str) -> Result<ServedAsset, InterceptError> {
        match Strategy::classify(path) {
            Strategy::NetworkFirst => self.network_first(path).await,
            Strategy::CacheFirst => self.cache_first(path).await,
        }
    }

    async fn network_first(&self, path: &str) -> Result<ServedAsset, InterceptError> {
        tracing::debug!(path, "attempting to fetch first");
        match self.fetcher.fetch(path).await {
            Ok(asset) => Ok(ServedAsset {
                path: path.to_string(),
                body: asset.body.to_vec(),
                content_type: asset.content_type,
                source: ServedFrom::Network,
            }),
            Err(err) => {
                tracing::debug!(path, %err, "fetch failed, serving from cache");
                match self.cache.get_asset(path).await? {
                    Some(entry) => Ok(served_from_cache(entry)),
                    None => Err(InterceptError::Unavailable { path: path.to_string(), source: err }),
                }
            }
        }
    }

    async fn cache_first(&self, path: &str) -> Result<ServedAsset, InterceptError> {
        match self.cache.get_asset(path).await? {
            Some(entry) => {
                tracing::debug!(path, "serving from cache");
                Ok(served_from_cache(entry))
            }
            None => match self.fetcher.fetch(path).await {
                Ok(asset) => Ok(ServedAsset {
                    path: path.to_string(),
                    body: asset.body.to_vec(),
                    content_type: asset.content_type,
                    source: ServedFrom::Network,
                }),
                Err(err) => Err(InterceptError::Unavailable { path: path.to_string(), source: err }),
            },
        }
    }
}

fn served_from_cache(entry: microload_core::AssetEntry) -> ServedAsset {
    ServedAsset { path: entry.path, body: entry.body, content_type: entry.content_type, source: ServedFrom::Cache }
}
