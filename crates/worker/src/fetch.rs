//! HTTP fetch client for origin assets.
//!
//! Every network access in the worker goes through the [`AssetFetcher`]
//! seam: the populator, the interceptor, and the install precache all fetch
//! by canonical resource path and stay unaware of the transport. The
//! production implementation is [`OriginClient`], which resolves paths
//! against the configured origin.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use url::Url;

/// Error type for origin fetch failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid origin or path: {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("status {0}")]
    Status(u16),

    #[error("{len} bytes exceeds {max}")]
    TooLarge { len: usize, max: usize },
}

/// One asset as fetched from the origin.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Fetches assets by canonical resource path.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<FetchedAsset, FetchError>;
}

/// Configuration for the origin fetch client.
#[derive(Debug, Clone)]
pub struct OriginConfig {
    /// Origin base URL (default: "http://localhost:8080")
    pub origin: String,

    /// User agent string (default: "microload/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            user_agent: "microload/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
        }
    }
}

/// HTTP client resolving resource paths against the origin.
pub struct OriginClient {
    http: Client,
    origin: Url,
    config: OriginConfig,
}

impl OriginClient {
    /// Create a new origin client with the given configuration.
    pub fn new(config: OriginConfig) -> Result<Self, FetchError> {
        let origin = Url::parse(&config.origin).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { http, origin, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &OriginConfig {
        &self.config
    }
}

#[async_trait]
impl AssetFetcher for OriginClient {
    /// Fetch a resource path from the origin, returning raw bytes and the
    /// content type. Respects the configured byte limit.
    async fn fetch(&self, path: &str) -> Result<FetchedAsset, FetchError> {
        let start = Instant::now();
        let url = self.origin.join(path).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(FetchError::TooLarge { len: len as usize, max: self.config.max_bytes });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if body.len() > self.config.max_bytes {
            return Err(FetchError::TooLarge { len: body.len(), max: self.config.max_bytes });
        }

        tracing::debug!("fetched {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), body.len());

        Ok(FetchedAsset { body, content_type })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    /// Canned fetcher serving a fixed path-to-body map, with selective
    /// failures and a call log.
    #[derive(Debug, Default)]
    pub struct StaticFetcher {
        assets: BTreeMap<String, Vec<u8>>,
        failing: BTreeSet<String>,
        pub fetched: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_asset(mut self, path: &str, body: &[u8]) -> Self {
            self.assets.insert(path.to_string(), body.to_vec());
            self
        }

        pub fn with_failure(mut self, path: &str) -> Self {
            self.failing.insert(path.to_string());
            self
        }
    }

    #[async_trait]
    impl AssetFetcher for StaticFetcher {
        async fn fetch(&self, path: &str) -> Result<FetchedAsset, FetchError> {
            self.fetched.lock().unwrap().push(path.to_string());
            if self.failing.contains(path) {
                return Err(FetchError::Network("connection refused".to_string()));
            }
            match self.assets.get(path) {
                Some(body) => Ok(FetchedAsset {
                    body: Bytes::from(body.clone()),
                    content_type: Some("application/octet-stream".to_string()),
                }),
                None => Err(FetchError::Status(404)),
            }
        }
    }
}
