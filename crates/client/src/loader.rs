//! Client-side configuration synchronization.
//!
//! The [`Loader`] is the explicit context handle for everything the
//! foreground process tracks: its version registry, the asset list required
//! for offline readiness, and the port to the worker. Synchronization is
//! push-then-pull: the push tolerates a worker that is not listening yet,
//! while the pull only ever happens after activation, so one completed round
//! trip converges both registries with the worker's view of "current"
//! treated as authoritative.

use std::collections::BTreeMap;

use microload_core::protocol::{ConfigsPayload, ReadinessQuery, SaveConfigsPayload};
use microload_core::{ClientPort, ConfigRecord, Message, VersionRegistry, naming};

use crate::bootstrap::{BootstrapOptions, BootstrapOutcome, WorkerHost, wait_for_controller};
use crate::inject::AssetInjector;

/// Notable things a handled message can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    /// A pull response was merged and initial assets were injected.
    ConfigsApplied,
    /// A readiness report arrived.
    Readiness(BTreeMap<String, bool>),
}

/// Foreground loader state and protocol driver.
pub struct Loader<I> {
    registry: VersionRegistry,
    required_assets: Vec<String>,
    offline_possible: bool,
    port: Option<ClientPort>,
    injector: I,
}

impl<I: AssetInjector> Loader<I> {
    pub fn new(injector: I) -> Self {
        Self {
            registry: VersionRegistry::new(),
            required_assets: Vec::new(),
            offline_possible: false,
            port: None,
            injector,
        }
    }

    /// Run the bootstrap sequence: register the worker, wait for its
    /// controller, then synchronize configurations with it.
    ///
    /// On `Unsupported` or `TimedOut` the session continues online-only and
    /// no synchronization is attempted.
    pub async fn start(
        &mut self, host: &dyn WorkerHost, bundled: ConfigRecord, options: &BootstrapOptions,
    ) -> BootstrapOutcome {
        tracing::info!("starting loader");

        if !host.supports_workers() {
            tracing::warn!("host has no background worker support, offline mode unavailable");
            return BootstrapOutcome::Unsupported;
        }

        host.register();
        let Some(handle) = wait_for_controller(host, options).await else {
            return BootstrapOutcome::TimedOut;
        };

        self.port = Some(handle.connect());
        self.offline_possible = true;

        self.import_config(bundled, false);
        self.push_configs(false);
        self.pull_configs();
        self.pump_until_applied().await;

        BootstrapOutcome::Ready
    }

    /// Add a configuration to the registry, electing it as current when the
    /// registry had none or `make_current` is set, and recompute the
    /// required-asset list from the current record's `initial` sequence.
    pub fn import_config(&mut self, record: ConfigRecord, make_current: bool) {
        tracing::debug!(version = %record.app_version, "importing config");
        self.registry.import(record, make_current);
        self.refresh_required_assets();
    }

    /// Switch to an already-imported version and propagate the election to
    /// the worker. Unknown versions are a logged no-op.
    pub async fn set_current_config(&mut self, version: &str) {
        if !self.registry.contains(version) {
            tracing::warn!(version, "version is not in configs");
            return;
        }
        self.registry.elect(version);
        self.refresh_required_assets();
        self.push_configs(true);
        self.pull_configs();
        self.pump_until_applied().await;
    }

    /// Ask the worker which required assets are cached.
    ///
    /// Returns `None` when offline support never came up or the worker went
    /// away mid-query.
    pub async fn offline_readiness(&mut self) -> Option<BTreeMap<String, bool>> {
        if !self.offline_possible {
            return None;
        }
        self.send(&Message::AskReadiness(ReadinessQuery { required_assets: self.required_assets.clone() }));
        match self.pump_until(|event| matches!(event, LoaderEvent::Readiness(_))).await? {
            LoaderEvent::Readiness(report) => Some(report),
            _ => None,
        }
    }

    /// Handle one message from the worker.
    pub fn handle_message(&mut self, message: Message) -> Option<LoaderEvent> {
        match message {
            Message::RespondConfigs(payload) => {
                tracing::debug!(configs = payload.configs.len(), "got saved configs from worker");
                self.apply_configs(payload);
                Some(LoaderEvent::ConfigsApplied)
            }
            Message::RespondReadiness(payload) => Some(LoaderEvent::Readiness(payload.readiness_report)),
            other => {
                tracing::warn!(?other, "ignoring message not addressed to a client");
                None
            }
        }
    }

    /// Merge a pull response: import every record, elect the worker's
    /// current version, then hand the initial assets to the injector.
    fn apply_configs(&mut self, payload: ConfigsPayload) {
        let worker_current = payload.current_config.as_ref().map(|record| record.app_version.clone());
        for (version, record) in payload.configs {
            let make_current = worker_current.as_deref() == Some(version.as_str());
            self.import_config(record, make_current);
        }
        self.load_initial_assets();
    }

    fn load_initial_assets(&mut self) {
        let Some(current) = self.registry.current() else {
            return;
        };
        let assets: Vec<String> = current
            .assets
            .initial
            .iter()
            .map(|name| naming::versioned_asset_name(name, current))
            .collect();
        tracing::info!(version = %current.app_version, "loading initial assets");
        self.injector.inject(&assets);
    }

    fn refresh_required_assets(&mut self) {
        if let Some(current) = self.registry.current() {
            self.required_assets = current.assets.initial.clone();
        }
    }

    fn push_configs(&self, force_current_config: bool) {
        self.send(&Message::SaveConfigs(SaveConfigsPayload {
            configs: self.registry.configs().clone(),
            current_config: self.registry.current().cloned(),
            force_current_config,
        }));
    }

    fn pull_configs(&self) {
        self.send(&Message::AskConfigs);
    }

    fn send(&self, message: &Message) {
        match &self.port {
            Some(port) => port.send(message),
            None => tracing::warn!("no worker controller, message dropped"),
        }
    }

    async fn pump_until_applied(&mut self) {
        self.pump_until(|event| matches!(event, LoaderEvent::ConfigsApplied)).await;
    }

    /// Drive the inbox until a handled message produces the wanted event.
    /// Returns `None` if the worker side closed first.
    async fn pump_until(&mut self, want: fn(&LoaderEvent) -> bool) -> Option<LoaderEvent> {
        loop {
            let message = self.port.as_mut()?.recv().await?;
            if let Some(event) = self.handle_message(message)
                && want(&event)
            {
                return Some(event);
            }
        }
    }

    pub fn offline_possible(&self) -> bool {
        self.offline_possible
    }

    pub fn current_version(&self) -> Option<&str> {
        self.registry.current_version()
    }

    pub fn required_assets(&self) -> &[String] {
        &self.required_assets
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }
}

/// Share of a readiness report that is cached, as a percentage.
/// An empty report counts as 0 rather than dividing by zero.
pub fn readiness_percentage(report: &BTreeMap<String, bool>) -> f64 {
    if report.is_empty() {
        return 0.0;
    }
    let ready = report.values().filter(|present| **present).count();
    ready as f64 / report.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use microload_core::AssetManifest;

    #[derive(Debug, Default)]
    struct RecordingInjector {
        injected: Vec<Vec<String>>,
    }

    impl AssetInjector for RecordingInjector {
        fn inject(&mut self, assets: &[String]) {
            self.injected.push(assets.to_vec());
        }
    }

    fn record(version: &str, initial: &[&str]) -> ConfigRecord {
        ConfigRecord {
            app_version: version.to_string(),
            loader_version: "1.0.2".to_string(),
            assets: AssetManifest {
                initial: initial.iter().map(|s| s.to_string()).collect(),
                runtime: Vec::new(),
                universal: Vec::new(),
            },
        }
    }

    #[test]
    fn test_import_into_empty_registry_elects_and_tracks_required_assets() {
        let mut loader = Loader::new(RecordingInjector::default());
        loader.import_config(record("1.0.0", &["app.js"]), true);

        assert_eq!(loader.current_version(), Some("1.0.0"));
        assert_eq!(loader.required_assets(), &["app.js".to_string()]);
    }

    #[test]
    fn test_apply_configs_elects_worker_current_and_injects() {
        let mut loader = Loader::new(RecordingInjector::default());
        loader.import_config(record("1.0.0", &["app.js"]), false);

        let mut configs = BTreeMap::new();
        configs.insert("1.0.0".to_string(), record("1.0.0", &["app.js"]));
        configs.insert("1.0.1".to_string(), record("1.0.1", &["app.js", "app.css"]));
        let event = loader.handle_message(Message::RespondConfigs(ConfigsPayload {
            configs,
            current_config: Some(record("1.0.1", &["app.js", "app.css"])),
        }));

        assert_eq!(event, Some(LoaderEvent::ConfigsApplied));
        assert_eq!(loader.current_version(), Some("1.0.1"));
        assert_eq!(loader.required_assets(), &["app.js".to_string(), "app.css".to_string()]);
        assert_eq!(
            loader.injector.injected,
            vec![vec!["app1.0.1.js".to_string(), "app1.0.1.css".to_string()]]
        );
    }

    #[test]
    fn test_worker_bound_message_ignored() {
        let mut loader = Loader::new(RecordingInjector::default());
        let event = loader.handle_message(Message::AskConfigs);
        assert_eq!(event, None);
    }

    #[tokio::test]
    async fn test_set_current_config_unknown_version_is_noop() {
        let mut loader = Loader::new(RecordingInjector::default());
        loader.import_config(record("1.0.0", &["app.js"]), true);

        loader.set_current_config("9.9.9").await;

        assert_eq!(loader.current_version(), Some("1.0.0"));
        assert!(loader.injector.injected.is_empty());
    }

    #[test]
    fn test_readiness_percentage_boundaries() {
        assert_eq!(readiness_percentage(&BTreeMap::new()), 0.0);

        let mut all_ready = BTreeMap::new();
        all_ready.insert("app.js".to_string(), true);
        all_ready.insert("app.css".to_string(), true);
        assert_eq!(readiness_percentage(&all_ready), 100.0);

        let mut half = BTreeMap::new();
        half.insert("app.js".to_string(), true);
        half.insert("app.css".to_string(), false);
        assert_eq!(readiness_percentage(&half), 50.0);
    }
}
