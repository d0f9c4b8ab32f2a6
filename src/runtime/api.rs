//! API-facing request/response models for the operator control surface.
//!
//! These are transport-neutral: an HTTP layer deserializes the request types,
//! calls the functions here and serializes the responses.

use serde::{Deserialize, Serialize};

use crate::core::{AdmissionController, AdmissionError, ControllerStatus, Resource};
use crate::runtime::scheduler::{SchedulerStatus, WeekendScheduler};

/// Partial override update. Omitted resources keep their current ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideRequest {
    /// CPU ceiling percentage.
    #[serde(default)]
    pub cpu: Option<f64>,
    /// GPU ceiling percentage.
    #[serde(default)]
    pub gpu: Option<f64>,
}

/// Active override ceilings; `None` means the forecast is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverrideResponse {
    /// CPU ceiling percentage.
    pub override_cpu: Option<f64>,
    /// GPU ceiling percentage.
    pub override_gpu: Option<f64>,
}

/// Scheduler and controller state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    /// Trigger state.
    pub scheduler: SchedulerStatus,
    /// Controller state.
    pub controller: ControllerStatus,
}

/// Outcome of enable/disable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    /// Human-readable result.
    pub message: String,
    /// Whether ticks are now paused.
    pub paused: bool,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Error payload returned for rejected requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

impl From<AdmissionError> for ErrorResponse {
    fn from(err: AdmissionError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

fn to_response(controller: &AdmissionController) -> OverrideResponse {
    let current = controller.get_override();
    OverrideResponse {
        override_cpu: current.cpu_ceiling_pct,
        override_gpu: current.gpu_ceiling_pct,
    }
}

/// Current override ceilings.
pub fn get_override(controller: &AdmissionController) -> OverrideResponse {
    to_response(controller)
}

/// Apply a partial override update.
pub fn set_override(
    controller: &AdmissionController,
    req: OverrideRequest,
) -> Result<OverrideResponse, ErrorResponse> {
    controller.set_override(req.cpu, req.gpu)?;
    Ok(to_response(controller))
}

/// Clear one ceiling, or all of them when `resource` is `None`.
pub fn reset_override(
    controller: &AdmissionController,
    resource: Option<Resource>,
) -> OverrideResponse {
    match resource {
        Some(resource) => {
            controller.clear_override_for(resource);
        }
        None => controller.clear_override(),
    }
    to_response(controller)
}

/// Resume ticking.
pub fn enable(scheduler: &WeekendScheduler) -> ToggleResponse {
    if scheduler.is_paused() {
        scheduler.resume();
        ToggleResponse {
            message: "admission ticks enabled".into(),
            paused: false,
        }
    } else {
        ToggleResponse {
            message: "admission ticks already enabled".into(),
            paused: false,
        }
    }
}

/// Pause ticking.
pub fn disable(scheduler: &WeekendScheduler) -> ToggleResponse {
    if scheduler.is_paused() {
        ToggleResponse {
            message: "admission ticks already disabled".into(),
            paused: true,
        }
    } else {
        scheduler.pause();
        ToggleResponse {
            message: "admission ticks disabled".into(),
            paused: true,
        }
    }
}

/// Combined status.
pub fn status(scheduler: &WeekendScheduler) -> StatusResponse {
    StatusResponse {
        scheduler: scheduler.status(),
        controller: scheduler.controller().status(),
    }
}

/// Return a health payload.
pub const fn health() -> Health {
    Health { ok: true }
}
