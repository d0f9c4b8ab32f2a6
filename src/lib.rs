//! # taskshift
//!
//! Weekend admission control for an HPC cluster.
//!
//! Some jobs are parked in the job system as deferred because they are not
//! urgent. Over the weekend the cluster is usually quiet, so this crate
//! launches those jobs one at a time, as long as:
//!
//! - the task's CPU and GPU share of the cluster stays under what the
//!   forecast (or an operator override) says will be free that day;
//! - the task's time limit lets it finish before Monday 00:00.
//!
//! ## Moving parts
//!
//! - [`core::AdmissionController`] holds the candidate queue, the cached
//!   forecast and the operator override, and runs one admission round per
//!   [`core::AdmissionController::tick`].
//! - [`core::CapacityForecast`] and [`core::TaskSource`] are the ports to the
//!   forecasting service and the job system. [`infra`] has an HTTP job system
//!   client and in-memory adapters.
//! - [`runtime::WeekendScheduler`] fires the weekly refresh and the weekend
//!   ticks on tokio, with pause/resume for operators.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskshift::builders::build_controller;
//! use taskshift::config::ControllerConfig;
//! use taskshift::infra::StaticForecast;
//! use taskshift::runtime::{TokioSpawner, Triggers, WeekendScheduler};
//!
//! let cfg = ControllerConfig::load("taskshift.json")?;
//! let controller = Arc::new(build_controller(&cfg, Arc::new(StaticForecast::empty()))?);
//! let scheduler = Arc::new(WeekendScheduler::new(controller, Triggers::from_config(&cfg.schedule)?));
//! scheduler.start(&TokioSpawner::current());
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core admission abstractions: tasks, queue, forecast, controller.
pub mod core;
/// Configuration models for topology, job system and triggers.
pub mod config;
/// Builders to construct controller components from configuration.
pub mod builders;
/// Infrastructure adapters for the job system and forecast ports.
pub mod infra;
/// Tokio-driven triggers and operator API surface.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
