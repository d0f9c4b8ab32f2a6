//! Core admission-control abstractions.

pub mod audit;
pub mod controller;
pub mod error;
pub mod forecast;
pub mod queue;
pub mod resource_override;
pub mod task;
pub mod task_source;
pub mod topology;
pub mod window;

pub use audit::{AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, build_audit_event};
pub use controller::{
    AdmissionController, Availability, ControllerStatus, ForecastWindow, TickOutcome, TickReport,
    Verdict,
};
pub use error::{AdmissionError, AppResult};
pub use forecast::{CapacityForecast, DayAverages, ForecastSnapshot, SAMPLES_PER_DAY};
pub use queue::{ReconcileSummary, UniqueTaskQueue};
pub use resource_override::{Resource, ResourceOverride};
pub use task::{Task, TaskId, TaskRecord};
pub use task_source::TaskSource;
pub use topology::{ClusterTopology, RequestShare};
pub use window::{next_monday_midnight, WindowDay};
