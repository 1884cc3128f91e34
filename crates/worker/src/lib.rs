//! Background worker for microload.
//!
//! This crate provides the worker half of the protocol: the origin fetch
//! client, the cache populator, the readiness evaluator, the request
//! interceptor, and the message-handling service loop, plus the in-process
//! host implementation the `microload` binary wires everything through.

pub mod fetch;
pub mod host;
pub mod intercept;
pub mod populate;
pub mod readiness;
pub mod service;

pub use fetch::{AssetFetcher, FetchError, FetchedAsset, OriginClient, OriginConfig};
pub use host::LocalHost;
pub use intercept::{InterceptError, Interceptor, ServedAsset, ServedFrom, Strategy};
pub use service::Worker;
