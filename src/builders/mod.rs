//! Builders to construct controller components from configuration.

pub mod controller_builder;

#[cfg(feature = "tokio-runtime")]
pub use controller_builder::build_controller;
pub use controller_builder::{build_controller_with_source, build_task_source};
