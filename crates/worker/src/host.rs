//! In-process host environment.
//!
//! [`LocalHost`] runs the worker as a background tokio task in the same
//! process. The controller only becomes visible to the bootstrap sequencer
//! after the worker's install pass has finished, which is the activation
//! delay the client polls through.

use std::sync::{Arc, Mutex};

use microload_client::WorkerHost;
use microload_core::{CacheDb, WorkerHandle, worker_channel};

use crate::fetch::AssetFetcher;
use crate::service::Worker;

/// Host that spawns the worker in-process.
pub struct LocalHost {
    cache: CacheDb,
    fetcher: Arc<dyn AssetFetcher>,
    controller: Arc<Mutex<Option<WorkerHandle>>>,
}

impl LocalHost {
    pub fn new(cache: CacheDb, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self { cache, fetcher, controller: Arc::new(Mutex::new(None)) }
    }
}

impl WorkerHost for LocalHost {
    fn supports_workers(&self) -> bool {
        true
    }

    /// Spawn the worker task. Registration is idempotent: a second call on a
    /// host with a live controller does nothing.
    fn register(&self) {
        if self.controller.lock().unwrap().is_some() {
            return;
        }

        let worker = Worker::new(self.cache.clone(), self.fetcher.clone());
        let (handle, port) = worker_channel();
        let controller = self.controller.clone();

        tokio::spawn(async move {
            worker.install().await;
            controller.lock().unwrap().replace(handle);
            worker.serve(port).await;
        });
    }

    fn controller(&self) -> Option<WorkerHandle> {
        self.controller.lock().unwrap().clone()
    }
}
