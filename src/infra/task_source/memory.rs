//! In-memory job system for development, dry runs and tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{AdmissionError, Task, TaskId, TaskSource};

#[derive(Debug, Default)]
struct Inner {
    pending: HashMap<TaskId, Task>,
    running: HashSet<TaskId>,
    launched: Vec<TaskId>,
    start_on_launch: bool,
    fail_listings: bool,
    fail_launches: bool,
}

/// Simple in-memory [`TaskSource`].
///
/// By default a launch moves the task from pending to running. Call
/// [`InMemoryTaskSource::set_start_on_launch`] with `false` to simulate a job
/// system that accepts the launch request but never starts the job.
#[derive(Debug)]
pub struct InMemoryTaskSource {
    inner: Mutex<Inner>,
}

impl Default for InMemoryTaskSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskSource {
    /// Create an empty job system.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                start_on_launch: true,
                ..Inner::default()
            }),
        }
    }

    /// Add or replace a pending task.
    pub fn add_pending(&self, task: Task) {
        self.inner.lock().pending.insert(task.id.clone(), task);
    }

    /// Drop a task from the pending set without running it.
    pub fn remove_pending(&self, id: &str) {
        self.inner.lock().pending.remove(id);
    }

    /// Mark a task as running, removing it from pending.
    pub fn start(&self, id: &str) {
        let mut inner = self.inner.lock();
        inner.pending.remove(id);
        inner.running.insert(id.to_string());
    }

    /// Whether a launch moves the task to running.
    pub fn set_start_on_launch(&self, start: bool) {
        self.inner.lock().start_on_launch = start;
    }

    /// Make listing calls fail as if retries were exhausted.
    pub fn set_fail_listings(&self, fail: bool) {
        self.inner.lock().fail_listings = fail;
    }

    /// Make launch calls fail as if retries were exhausted.
    pub fn set_fail_launches(&self, fail: bool) {
        self.inner.lock().fail_launches = fail;
    }

    /// Every id a launch was requested for, in order.
    pub fn launched(&self) -> Vec<TaskId> {
        self.inner.lock().launched.clone()
    }

    fn unavailable(operation: &str) -> AdmissionError {
        AdmissionError::RemoteUnavailable {
            operation: operation.to_string(),
            attempts: 1,
            last_error: "job system offline".into(),
        }
    }
}

#[async_trait]
impl TaskSource for InMemoryTaskSource {
    async fn list_running(&self) -> Result<HashSet<TaskId>, AdmissionError> {
        let inner = self.inner.lock();
        if inner.fail_listings {
            return Err(Self::unavailable("list_running"));
        }
        Ok(inner.running.clone())
    }

    async fn list_pending(&self) -> Result<HashMap<TaskId, Task>, AdmissionError> {
        let inner = self.inner.lock();
        if inner.fail_listings {
            return Err(Self::unavailable("list_pending"));
        }
        Ok(inner.pending.clone())
    }

    async fn launch(&self, id: &str) -> Result<(), AdmissionError> {
        let mut inner = self.inner.lock();
        if inner.fail_launches {
            return Err(Self::unavailable("launch"));
        }
        inner.launched.push(id.to_string());
        if inner.start_on_launch && inner.pending.remove(id).is_some() {
            inner.running.insert(id.to_string());
        }
        Ok(())
    }
}
