//! Worker message-handling service.
//!
//! The [`Worker`] owns the authoritative registry copy and the cache store
//! for the lifetime of the process. It installs (precaching the entry
//! routes), then serves protocol messages until every client handle is gone.

use std::sync::Arc;

use microload_core::protocol::{ConfigsPayload, ReadinessPayload, SaveConfigsPayload};
use microload_core::{CacheDb, Message, VersionRegistry, WorkerPort, channel::ReplySender};

use crate::fetch::AssetFetcher;
use crate::{populate, readiness};

/// Entry routes cached before the worker starts serving, so the app shell
/// is available offline even if no configuration is ever pushed.
const INSTALL_PRECACHE: &[&str] = &["/", "/index.html"];

/// Background worker state and protocol driver.
pub struct Worker {
    registry: VersionRegistry,
    cache: CacheDb,
    fetcher: Arc<dyn AssetFetcher>,
}

impl Worker {
    pub fn new(cache: CacheDb, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self { registry: VersionRegistry::new(), cache, fetcher }
    }

    /// Install-time precache of the entry routes. Best-effort, like any
    /// population pass.
    pub async fn install(&self) {
        tracing::info!("installing worker");
        let paths = INSTALL_PRECACHE.iter().map(|p| p.to_string()).collect();
        populate::populate(self.cache.clone(), self.fetcher.clone(), paths).await;
    }

    /// Serve protocol messages until every client handle has been dropped.
    pub async fn serve(mut self, mut port: WorkerPort) {
        tracing::info!("worker activated");
        while let Some((message, reply)) = port.recv().await {
            self.handle(message, reply).await;
        }
        tracing::info!("all client ports closed, worker stopping");
    }

    /// Install, then serve.
    pub async fn run(self, port: WorkerPort) {
        self.install().await;
        self.serve(port).await;
    }

    async fn handle(&mut self, message: Message, reply: ReplySender) {
        match message {
            Message::SaveConfigs(payload) => self.save_configs(payload),
            Message::AskConfigs => {
                tracing::debug!("sending configs to client");
                reply.send(&Message::RespondConfigs(ConfigsPayload {
                    configs: self.registry.configs().clone(),
                    current_config: self.registry.current().cloned(),
                }));
            }
            Message::AskReadiness(query) => {
                match readiness::evaluate(&self.cache, &query.required_assets, self.registry.current()).await {
                    Ok(report) => {
                        tracing::debug!("sending readiness report to client");
                        reply.send(&Message::RespondReadiness(ReadinessPayload { readiness_report: report }));
                    }
                    Err(err) => tracing::error!(%err, "readiness evaluation failed"),
                }
            }
            Message::RespondConfigs(_) | Message::RespondReadiness(_) => {
                tracing::warn!("ignoring response message addressed to a client");
            }
        }
    }

    /// Merge a pushed snapshot and kick off a population pass.
    ///
    /// The client's current record is elected only when this registry had no
    /// current version yet or the push forces it. Population runs as a
    /// spawned task: a pull answered right after this merge reflects the
    /// registry, not cache completeness.
    fn save_configs(&mut self, payload: SaveConfigsPayload) {
        tracing::info!(configs = payload.configs.len(), "saving configs from client");
        let had_current = self.registry.current_version().is_some();

        for record in payload.configs.into_values() {
            self.registry.import(record, false);
        }

        if let Some(current) = payload.current_config {
            let version = current.app_version.clone();
            self.registry.import(current, false);
            if !had_current || payload.force_current_config {
                self.registry.elect(&version);
            }
        }

        let paths = populate::required_paths(&self.registry);
        tracing::debug!(paths = paths.len(), "updating cache from configs");
        tokio::spawn(populate::populate(self.cache.clone(), self.fetcher.clone(), paths));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticFetcher;
    use microload_core::protocol::ReadinessQuery;
    use microload_core::{AssetManifest, ConfigRecord, worker_channel};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn record(app: &str, initial: &[&str]) -> ConfigRecord {
        ConfigRecord {
            app_version: app.to_string(),
            loader_version: "1.0.2".to_string(),
            assets: AssetManifest {
                initial: initial.iter().map(|s| s.to_string()).collect(),
                runtime: Vec::new(),
                universal: Vec::new(),
            },
        }
    }

    fn save(configs: &[ConfigRecord], current: &ConfigRecord, force: bool) -> Message {
        Message::SaveConfigs(SaveConfigsPayload {
            configs: configs
                .iter()
                .map(|r| (r.app_version.clone(), r.clone()))
                .collect::<BTreeMap<_, _>>(),
            current_config: Some(current.clone()),
            force_current_config: force,
        })
    }

    async fn spawn_worker(fetcher: StaticFetcher) -> (CacheDb, microload_core::WorkerHandle) {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let (handle, port) = worker_channel();
        tokio::spawn(Worker::new(cache.clone(), Arc::new(fetcher)).serve(port));
        (cache, handle)
    }

    async fn wait_for_asset(cache: &CacheDb, path: &str) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cache.contains_asset(path).await.unwrap() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("asset not cached in time");
    }

    #[tokio::test]
    async fn test_push_then_pull_converges() {
        let fetcher = StaticFetcher::new().with_asset("/app1.0.0.js", b"js").with_asset("/loader1.0.2.js", b"loader");
        let (cache, handle) = spawn_worker(fetcher).await;
        let mut port = handle.connect();

        let config = record("1.0.0", &["app.js"]);
        port.send(&save(&[config.clone()], &config, false));
        port.send(&Message::AskConfigs);

        match port.recv().await.unwrap() {
            Message::RespondConfigs(payload) => {
                assert_eq!(payload.configs.len(), 1);
                assert!(payload.configs.contains_key("1.0.0"));
                assert_eq!(payload.current_config.unwrap().app_version, "1.0.0");
            }
            other => panic!("unexpected response: {other:?}"),
        }

        // Population was spawned off the save; it completes independently
        // of the pull response above.
        wait_for_asset(&cache, "/app1.0.0.js").await;
        wait_for_asset(&cache, "/loader1.0.2.js").await;
    }

    #[tokio::test]
    async fn test_unforced_push_keeps_existing_versions_and_current() {
        let (_cache, handle) = spawn_worker(StaticFetcher::new()).await;
        let mut port = handle.connect();

        let v100 = record("1.0.0", &["app.js"]);
        let v101 = record("1.0.1", &["app.js"]);
        port.send(&save(&[v100.clone(), v101.clone()], &v101, false));
        // A fresh session that only knows 1.0.1 pushes its snapshot.
        port.send(&save(&[v101.clone()], &v101, false));
        port.send(&Message::AskConfigs);

        match port.recv().await.unwrap() {
            Message::RespondConfigs(payload) => {
                assert_eq!(payload.configs.len(), 2);
                assert!(payload.configs.contains_key("1.0.0"));
                assert!(payload.configs.contains_key("1.0.1"));
                assert_eq!(payload.current_config.unwrap().app_version, "1.0.1");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_forced_push_reassigns_current() {
        let (_cache, handle) = spawn_worker(StaticFetcher::new()).await;
        let mut port = handle.connect();

        let v100 = record("1.0.0", &["app.js"]);
        let v101 = record("1.0.1", &["app.js"]);
        port.send(&save(&[v100.clone(), v101.clone()], &v101, false));
        port.send(&save(&[v100.clone()], &v100, true));
        port.send(&Message::AskConfigs);

        match port.recv().await.unwrap() {
            Message::RespondConfigs(payload) => {
                assert_eq!(payload.current_config.unwrap().app_version, "1.0.0");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_readiness_over_protocol() {
        let fetcher = StaticFetcher::new().with_asset("/app1.0.0.js", b"js").with_asset("/loader1.0.2.js", b"loader");
        let (cache, handle) = spawn_worker(fetcher).await;
        let mut port = handle.connect();

        let config = record("1.0.0", &["app.js", "app.css"]);
        port.send(&save(&[config.clone()], &config, false));
        wait_for_asset(&cache, "/app1.0.0.js").await;

        port.send(&Message::AskReadiness(ReadinessQuery {
            required_assets: vec!["app.js".to_string(), "app.css".to_string()],
        }));

        match port.recv().await.unwrap() {
            Message::RespondReadiness(payload) => {
                assert_eq!(payload.readiness_report["app.js"], true);
                assert_eq!(payload.readiness_report["app.css"], false);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_response_messages_are_ignored() {
        let (_cache, handle) = spawn_worker(StaticFetcher::new()).await;
        let mut port = handle.connect();

        port.send(&Message::RespondReadiness(ReadinessPayload { readiness_report: BTreeMap::new() }));
        port.send(&Message::AskConfigs);

        // The stray response is dropped and the next request still answers.
        assert!(matches!(port.recv().await.unwrap(), Message::RespondConfigs(_)));
    }
}
