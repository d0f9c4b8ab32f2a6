//! Tokio runtime spawner used by the scheduler loops.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

/// Spawns background loops onto a tokio runtime.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: Handle,
    // Keeps an owned runtime alive for as long as any spawner clone exists.
    _runtime: Option<Arc<Runtime>>,
}

impl TokioSpawner {
    /// Create a spawner from an existing runtime handle.
    pub const fn new(handle: Handle) -> Self {
        Self {
            handle,
            _runtime: None,
        }
    }

    /// Spawner for the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Create a spawner that owns a new multi-threaded runtime.
    pub fn with_worker_threads(worker_threads: usize) -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("taskshift-scheduler")
            .enable_all()
            .build()?;
        Ok(Self {
            handle: runtime.handle().clone(),
            _runtime: Some(Arc::new(runtime)),
        })
    }

    /// Spawn a background future.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut)
    }

    /// Underlying runtime handle.
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }
}
