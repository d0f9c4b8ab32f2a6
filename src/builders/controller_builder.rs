//! Builders to construct an admission controller from configuration.

use std::sync::Arc;

use crate::config::{ControllerConfig, TaskSourceConfig};
use crate::core::{AdmissionController, AdmissionError, CapacityForecast, TaskSource};
use crate::infra::task_source::{
    Delay, Endpoints, ReqwestTransport, RetryPolicy, TaskMasterClient,
};

/// Build the HTTP job system client described by `cfg`.
pub fn build_task_source(
    cfg: &TaskSourceConfig,
    delay: Arc<dyn Delay>,
) -> Result<TaskMasterClient<ReqwestTransport>, AdmissionError> {
    cfg.validate()
        .map_err(|e| AdmissionError::Configuration(format!("task_source invalid: {e}")))?;
    if cfg.credential.is_empty() {
        tracing::warn!("job system credential is empty; requests will be sent without a token");
    }

    let transport = ReqwestTransport::new(&cfg.base_url, &cfg.credential, cfg.request_timeout())?;
    let endpoints = Endpoints {
        running: cfg.running_path.clone(),
        pending: cfg.pending_path.clone(),
        launch_prefix: cfg.launch_path_prefix.clone(),
    };
    let policy = RetryPolicy {
        max_attempts: cfg.max_attempts,
        delay: cfg.retry_delay(),
    };
    Ok(TaskMasterClient::new(transport, endpoints, policy, delay))
}

/// Build a controller from configuration using the supplied forecast port
/// and an explicit task source.
pub fn build_controller_with_source(
    cfg: &ControllerConfig,
    forecast: Arc<dyn CapacityForecast>,
    source: Arc<dyn TaskSource>,
) -> Result<AdmissionController, AdmissionError> {
    cfg.validate()
        .map_err(|e| AdmissionError::Configuration(format!("config invalid: {e}")))?;
    let topology = cfg.topology.topology()?;
    tracing::info!(
        cpu_cores = topology.total_cpu_cores(),
        gpu_units = topology.total_gpu_units(),
        "cluster topology loaded"
    );
    Ok(AdmissionController::new(topology, forecast, source))
}

/// Build a controller that talks to the configured job system over HTTP.
#[cfg(feature = "tokio-runtime")]
pub fn build_controller(
    cfg: &ControllerConfig,
    forecast: Arc<dyn CapacityForecast>,
) -> Result<AdmissionController, AdmissionError> {
    let source = build_task_source(&cfg.task_source, Arc::new(crate::infra::task_source::TokioDelay))?;
    build_controller_with_source(cfg, forecast, Arc::new(source))
}
