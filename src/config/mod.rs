//! Configuration models for the controller, job system and triggers.

pub mod controller;

pub use controller::{
    ControllerConfig, CpuSpec, GpuSpec, NodeConfig, ScheduleConfig, TaskSourceConfig,
    TopologyConfig, ENV_HOST, ENV_TOKEN,
};
