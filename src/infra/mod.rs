//! Infrastructure adapters for the forecast and job system ports.

pub mod forecast;
pub mod task_source;

pub use forecast::StaticForecast;
pub use task_source::{InMemoryTaskSource, TaskMasterClient};
