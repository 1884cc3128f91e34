//! Core types and shared functionality for microload.
//!
//! This crate provides:
//! - Configuration records and the per-process version registry
//! - Versioned asset name derivation
//! - The client/worker wire protocol and messaging channel
//! - Cache store implementation with SQLite backend
//! - Unified error types

pub mod cache;
pub mod channel;
pub mod config;
pub mod error;
pub mod naming;
pub mod protocol;
pub mod record;
pub mod registry;

pub use cache::{AssetEntry, CacheDb};
pub use channel::{ClientPort, WorkerHandle, WorkerPort, worker_channel};
pub use error::Error;
pub use protocol::Message;
pub use record::{AssetManifest, ConfigRecord};
pub use registry::VersionRegistry;
