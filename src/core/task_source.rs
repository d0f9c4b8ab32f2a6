//! Port to the external job system.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::core::{AdmissionError, Task, TaskId};

/// Job system the controller discovers candidates from and launches into.
///
/// Implementations retry transient failures internally and only return
/// [`AdmissionError::RemoteUnavailable`] once retries are exhausted. They must
/// never substitute an empty listing for a failed one.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Ids of jobs currently running.
    async fn list_running(&self) -> Result<HashSet<TaskId>, AdmissionError>;
    /// Jobs currently deferred and eligible for weekend admission.
    async fn list_pending(&self) -> Result<HashMap<TaskId, Task>, AdmissionError>;
    /// Ask the job system to start `id` now.
    async fn launch(&self, id: &str) -> Result<(), AdmissionError>;
}
