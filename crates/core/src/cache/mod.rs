//! SQLite-backed persistent cache for origin assets.
//!
//! This module provides the worker-owned content cache using SQLite with
//! async access via tokio-rusqlite. It supports:
//!
//! - Keyed storage under canonical resource paths
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//!
//! There is deliberately no eviction: entries persist until a populator run
//! replaces them, so assets of superseded versions stay available offline.

pub mod connection;
pub mod entries;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::AssetEntry;
