//! microload entry point.
//!
//! Boots the background worker in-process, runs the client bootstrap and
//! synchronization against it, then reports offline readiness. Logging goes
//! to stderr as JSON.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use microload_client::{BootstrapOptions, Loader, LogInjector, readiness_percentage};
use microload_core::config::AppConfig;
use microload_core::{CacheDb, ConfigRecord};
use microload_worker::{AssetFetcher, Interceptor, LocalHost, OriginClient, OriginConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, db_path = %config.db_path.display(), "starting microload");

    let cache = CacheDb::open(&config.db_path).await?;
    let fetcher: Arc<dyn AssetFetcher> = Arc::new(OriginClient::new(OriginConfig {
        origin: config.origin.clone(),
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
    })?);

    let host = LocalHost::new(cache.clone(), fetcher.clone());
    let bundled = ConfigRecord::load(&config.bundle_path)?;
    let options = BootstrapOptions {
        poll_interval: config.poll_interval(),
        activation_timeout: config.activation_timeout(),
    };

    let mut loader = Loader::new(LogInjector);
    let outcome = loader.start(&host, bundled, &options).await;
    tracing::info!(?outcome, current_version = ?loader.current_version(), "bootstrap finished");

    match loader.offline_readiness().await {
        Some(report) => {
            let percentage = readiness_percentage(&report);
            tracing::info!(?report, percentage, "offline readiness");
        }
        None => tracing::warn!("offline support unavailable for this session"),
    }

    // Serve the entry route once through the interceptor so a run exercises
    // the request path end to end.
    let interceptor = Interceptor::new(cache, fetcher);
    match interceptor.handle("/").await {
        Ok(served) => {
            tracing::info!(path = %served.path, source = ?served.source, bytes = served.body.len(), "served entry route");
        }
        Err(err) => tracing::warn!(%err, "entry route unavailable"),
    }

    Ok(())
}
