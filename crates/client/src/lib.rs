//! Client-side loader for microload.
//!
//! This crate provides the foreground half of the protocol: the bootstrap
//! sequencer that waits for the background worker to activate, the loader
//! context that synchronizes configuration versions with the worker, and the
//! injector seam through which initial assets reach the host UI.

pub mod bootstrap;
pub mod inject;
pub mod loader;

pub use bootstrap::{BootstrapOptions, BootstrapOutcome, WorkerHost, wait_for_controller};
pub use inject::{AssetInjector, LogInjector};
pub use loader::{Loader, LoaderEvent, readiness_percentage};
