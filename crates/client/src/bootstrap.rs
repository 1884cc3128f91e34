//! Startup sequencing against the background worker.
//!
//! The worker does not become addressable immediately after registration, so
//! the client polls for its controller at a fixed interval against a deadline
//! computed once up front. On timeout the session simply runs without offline
//! support; there is no in-session retry.

use std::time::Duration;

use tokio::time::Instant;

use microload_core::WorkerHandle;

/// Host environment the client runs inside.
///
/// The host owns worker registration and exposes the worker's controller once
/// activation has completed. Hosts without background-worker support report
/// it up front and the loader degrades to online-only mode.
pub trait WorkerHost {
    /// Whether this host can run background workers at all.
    fn supports_workers(&self) -> bool;

    /// Start the worker process from its known entry point.
    fn register(&self);

    /// The worker's controller, once the worker has activated.
    fn controller(&self) -> Option<WorkerHandle>;
}

/// Bootstrap timing knobs, defaulting to a 50ms poll against a 1s deadline.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub poll_interval: Duration,
    pub activation_timeout: Duration,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self { poll_interval: Duration::from_millis(50), activation_timeout: Duration::from_millis(1_000) }
    }
}

/// Terminal states of the bootstrap sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Worker activated; synchronization ran.
    Ready,
    /// Host has no background-worker support; online-only session.
    Unsupported,
    /// Worker never became controllable before the deadline; offline
    /// features stay unavailable for this session.
    TimedOut,
}

/// Poll the host for the worker's controller until it appears or the
/// deadline passes.
pub async fn wait_for_controller(host: &dyn WorkerHost, options: &BootstrapOptions) -> Option<WorkerHandle> {
    let deadline = Instant::now() + options.activation_timeout;
    loop {
        if let Some(handle) = host.controller() {
            tracing::debug!("worker controller is ready");
            return Some(handle);
        }
        if Instant::now() >= deadline {
            tracing::warn!(timeout_ms = options.activation_timeout.as_millis() as u64, "worker controller failed to appear in time");
            return None;
        }
        tokio::time::sleep(options.poll_interval).await;
    }
}
