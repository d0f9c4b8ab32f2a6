//! Bounded fixed-delay retry for calls to the job system.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::AdmissionError;

/// Attempt cap and pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(6),
        }
    }
}

/// Something that can wait. Injected so tests never sleep for real.
#[async_trait]
pub trait Delay: Send + Sync {
    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Delay backed by the tokio timer.
#[cfg(feature = "tokio-runtime")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[cfg(feature = "tokio-runtime")]
#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay that returns immediately and remembers what it was asked to wait.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested wait, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

impl RetryPolicy {
    /// Run `attempt` until it succeeds or the attempt cap is reached.
    ///
    /// Exhaustion is reported as [`AdmissionError::RemoteUnavailable`] carrying
    /// the last error message.
    pub async fn run<T, F, Fut>(
        &self,
        delay: &dyn Delay,
        operation: &str,
        mut attempt: F,
    ) -> Result<T, AdmissionError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, String>> + Send,
        T: Send,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = String::new();
        for n in 1..=max_attempts {
            match attempt().await {
                Ok(value) => {
                    if n > 1 {
                        tracing::info!("{} succeeded on attempt {}", operation, n);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    last_error = e;
                    if n < max_attempts {
                        tracing::warn!(
                            "{} failed (attempt {}/{}): {}; retrying in {:?}",
                            operation,
                            n,
                            max_attempts,
                            last_error,
                            self.delay
                        );
                        delay.sleep(self.delay).await;
                    }
                }
            }
        }
        tracing::error!(
            "{} failed after {} attempts, giving up: {}",
            operation,
            max_attempts,
            last_error
        );
        Err(AdmissionError::RemoteUnavailable {
            operation: operation.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let delay = RecordingDelay::new();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let value = policy
            .run(&delay, "list_pending", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(format!("status 503 on call {n}"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(delay.waits(), vec![Duration::from_secs(6); 3]);
    }

    #[tokio::test]
    async fn test_exhaustion_is_hard_failure() {
        let delay = RecordingDelay::new();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let err = policy
            .run(&delay, "launch", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("connection refused".to_string()) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(delay.waits().len(), 9);
        assert_eq!(
            err,
            AdmissionError::RemoteUnavailable {
                operation: "launch".into(),
                attempts: 10,
                last_error: "connection refused".into(),
            }
        );
    }
}
