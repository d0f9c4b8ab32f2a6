//! HTTP client for the cluster job system.
//!
//! Listings are JSON documents of the form `{"results": [ ... ]}` where each
//! entry carries `job_id`, `cpu_cores_count`, `gpu_count` and `time_limit`.
//! Every request is retried under a [`RetryPolicy`] and carries the static
//! `UserToken` credential.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::task::TaskRecord;
use crate::core::{AdmissionError, Task, TaskId, TaskSource};
use crate::infra::task_source::retry::{Delay, RetryPolicy};

/// Header carrying the static credential.
pub const CREDENTIAL_HEADER: &str = "UserToken";

/// Failure of a single request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Server answered with something other than 200.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// Request never got a response.
    #[error("request failed: {0}")]
    Network(String),
}

/// One-shot GET against the job system.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `path` relative to the service root and return the body.
    async fn get(&self, path: &str) -> Result<String, TransportError>;
}

/// [`Transport`] over a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    credential: String,
}

impl ReqwestTransport {
    /// Build a transport for `base_url` that sends `credential` with every request.
    pub fn new(
        base_url: impl Into<String>,
        credential: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdmissionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdmissionError::Configuration(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            credential: credential.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, path: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(self.url(path))
            .header(CREDENTIAL_HEADER, &self.credential)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if status != reqwest::StatusCode::OK {
            let body: String = body.chars().take(512).collect();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Request paths of the job system API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Listing of running jobs.
    pub running: String,
    /// Listing of deferred jobs.
    pub pending: String,
    /// Prefix the job id is appended to for a launch request.
    pub launch_prefix: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            running: "job/?state=1".into(),
            pending: "pending/".into(),
            launch_prefix: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    results: Vec<Value>,
}

/// Retrying [`TaskSource`] over a [`Transport`].
pub struct TaskMasterClient<T> {
    transport: T,
    endpoints: Endpoints,
    policy: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl<T: Transport> TaskMasterClient<T> {
    /// Create a client.
    pub fn new(transport: T, endpoints: Endpoints, policy: RetryPolicy, delay: Arc<dyn Delay>) -> Self {
        Self {
            transport,
            endpoints,
            policy,
            delay,
        }
    }

    async fn fetch_listing(&self, operation: &str, path: &str) -> Result<Vec<Value>, AdmissionError> {
        self.policy
            .run(self.delay.as_ref(), operation, || async move {
                let body = self.transport.get(path).await.map_err(|e| e.to_string())?;
                serde_json::from_str::<Listing>(&body)
                    .map(|listing| listing.results)
                    .map_err(|e| format!("malformed listing: {e}"))
            })
            .await
    }
}

#[async_trait]
impl<T: Transport> TaskSource for TaskMasterClient<T> {
    async fn list_running(&self) -> Result<HashSet<TaskId>, AdmissionError> {
        let records = self
            .fetch_listing("list_running", &self.endpoints.running)
            .await?;
        let mut ids = HashSet::with_capacity(records.len());
        for entry in records {
            match TaskRecord::from_value(entry).and_then(|record| record.id()) {
                Ok(id) => {
                    ids.insert(id);
                }
                Err(e) => tracing::warn!("skipping running record: {}", e),
            }
        }
        Ok(ids)
    }

    async fn list_pending(&self) -> Result<HashMap<TaskId, Task>, AdmissionError> {
        let records = self
            .fetch_listing("list_pending", &self.endpoints.pending)
            .await?;
        let mut tasks = HashMap::with_capacity(records.len());
        let mut skipped = 0usize;
        for entry in records {
            match TaskRecord::from_value(entry).and_then(Task::try_from) {
                Ok(task) => {
                    if tasks.contains_key(&task.id) {
                        tracing::warn!("duplicate pending record for {}, keeping the first", task.id);
                        continue;
                    }
                    tasks.insert(task.id.clone(), task);
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("skipping pending record: {}", e);
                }
            }
        }
        if skipped > 0 {
            tracing::warn!("{} malformed pending records ignored", skipped);
        }
        Ok(tasks)
    }

    async fn launch(&self, id: &str) -> Result<(), AdmissionError> {
        let path = format!("{}{}", self.endpoints.launch_prefix, id);
        let path = path.as_str();
        self.policy
            .run(self.delay.as_ref(), "launch", || async move {
                self.transport.get(path).await.map(|_| ()).map_err(|e| e.to_string())
            })
            .await
    }
}
