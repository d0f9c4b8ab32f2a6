//! Tokio-driven triggers and the operator API surface.

pub mod api;
pub mod scheduler;
pub mod tokio_spawner;

pub use api::{OverrideRequest, OverrideResponse, StatusResponse, ToggleResponse};
pub use scheduler::{SchedulerStatus, Triggers, WeekendScheduler};
pub use tokio_spawner::TokioSpawner;
