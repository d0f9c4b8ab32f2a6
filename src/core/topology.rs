//! Static cluster totals used to turn task requests into percentages.

use serde::{Deserialize, Serialize};

use crate::core::{AdmissionError, Task};

/// Total schedulable resources of the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    total_cpu_cores: u32,
    total_gpu_units: u32,
}

/// Share of the cluster a task would occupy, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestShare {
    /// CPU share.
    pub cpu_pct: f64,
    /// GPU share. Infinite when GPUs are requested on a GPU-less cluster.
    pub gpu_pct: f64,
}

impl ClusterTopology {
    /// Validate and build a topology. Zero CPU cores is a configuration error.
    pub fn new(total_cpu_cores: u32, total_gpu_units: u32) -> Result<Self, AdmissionError> {
        if total_cpu_cores == 0 {
            return Err(AdmissionError::Configuration(
                "cluster must have at least one CPU core".into(),
            ));
        }
        Ok(Self {
            total_cpu_cores,
            total_gpu_units,
        })
    }

    /// Total CPU cores.
    pub const fn total_cpu_cores(&self) -> u32 {
        self.total_cpu_cores
    }

    /// Total GPU units.
    pub const fn total_gpu_units(&self) -> u32 {
        self.total_gpu_units
    }

    /// Percentage of each resource `task` would take.
    pub fn share_of(&self, task: &Task) -> RequestShare {
        let cpu_pct = f64::from(task.cpu_cores) / f64::from(self.total_cpu_cores) * 100.0;
        let gpu_pct = if task.gpu_units == 0 {
            0.0
        } else if self.total_gpu_units == 0 {
            f64::INFINITY
        } else {
            f64::from(task.gpu_units) / f64::from(self.total_gpu_units) * 100.0
        };
        RequestShare { cpu_pct, gpu_pct }
    }
}
