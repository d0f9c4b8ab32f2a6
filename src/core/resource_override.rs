//! Operator-set availability ceilings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::AdmissionError;

/// Cluster resource kinds considered for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// CPU cores.
    Cpu,
    /// GPU units.
    Gpu,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Gpu => write!(f, "gpu"),
        }
    }
}

/// Ceiling percentages that replace forecast-derived availability when set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceOverride {
    /// CPU ceiling in percent.
    pub cpu_ceiling_pct: Option<f64>,
    /// GPU ceiling in percent.
    pub gpu_ceiling_pct: Option<f64>,
}

fn check(resource: Resource, value: f64) -> Result<f64, AdmissionError> {
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(AdmissionError::InvalidOverride(format!(
            "{resource} ceiling must be within [0, 100], got {value}"
        )))
    }
}

impl ResourceOverride {
    /// Update the supplied ceilings and leave the others untouched.
    ///
    /// Both values are validated before anything changes.
    pub fn apply(&mut self, cpu: Option<f64>, gpu: Option<f64>) -> Result<(), AdmissionError> {
        let cpu = cpu.map(|v| check(Resource::Cpu, v)).transpose()?;
        let gpu = gpu.map(|v| check(Resource::Gpu, v)).transpose()?;
        if cpu.is_some() {
            self.cpu_ceiling_pct = cpu;
        }
        if gpu.is_some() {
            self.gpu_ceiling_pct = gpu;
        }
        Ok(())
    }

    /// Remove the ceiling for one resource.
    pub fn clear_for(&mut self, resource: Resource) {
        match resource {
            Resource::Cpu => self.cpu_ceiling_pct = None,
            Resource::Gpu => self.gpu_ceiling_pct = None,
        }
    }

    /// Remove every ceiling.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Availability after applying the ceiling for `resource` to `forecasted`.
    pub fn effective(&self, resource: Resource, forecasted: f64) -> f64 {
        let ceiling = match resource {
            Resource::Cpu => self.cpu_ceiling_pct,
            Resource::Gpu => self.gpu_ceiling_pct,
        };
        ceiling.unwrap_or(forecasted)
    }
}
