//! Forecast snapshot model and the port used to refresh it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::window::WindowDay;
use crate::core::AdmissionError;

/// Forecast samples per day (15-minute resolution).
pub const SAMPLES_PER_DAY: usize = 96;

/// Predicted average utilization (percent) for each weekend day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    /// Average CPU utilization predicted for Saturday.
    pub cpu_avg_pct_saturday: f64,
    /// Average GPU utilization predicted for Saturday.
    pub gpu_avg_pct_saturday: f64,
    /// Average CPU utilization predicted for Sunday.
    pub cpu_avg_pct_sunday: f64,
    /// Average GPU utilization predicted for Sunday.
    pub gpu_avg_pct_sunday: f64,
}

/// Average utilization pair for one day.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DayAverages {
    /// CPU utilization percent.
    pub cpu_pct: f64,
    /// GPU utilization percent.
    pub gpu_pct: f64,
}

impl ForecastSnapshot {
    /// Build a snapshot, rejecting values outside `[0, 100]`.
    pub fn new(
        cpu_avg_pct_saturday: f64,
        gpu_avg_pct_saturday: f64,
        cpu_avg_pct_sunday: f64,
        gpu_avg_pct_sunday: f64,
    ) -> Result<Self, AdmissionError> {
        let snapshot = Self {
            cpu_avg_pct_saturday,
            gpu_avg_pct_saturday,
            cpu_avg_pct_sunday,
            gpu_avg_pct_sunday,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Reduce raw utilization forecasts to per-day averages.
    ///
    /// The first [`SAMPLES_PER_DAY`] samples cover Saturday, the next
    /// [`SAMPLES_PER_DAY`] cover Sunday. Anything after is ignored.
    pub fn from_series(cpu: &[f64], gpu: &[f64]) -> Result<Self, AdmissionError> {
        let needed = SAMPLES_PER_DAY * 2;
        if cpu.len() < needed || gpu.len() < needed {
            return Err(AdmissionError::ForecastUnavailable(format!(
                "need {needed} samples per resource, got cpu={} gpu={}",
                cpu.len(),
                gpu.len()
            )));
        }
        let (sat, sun) = (0..SAMPLES_PER_DAY, SAMPLES_PER_DAY..needed);
        Self::new(
            mean(&cpu[sat.clone()]),
            mean(&gpu[sat]),
            mean(&cpu[sun.clone()]),
            mean(&gpu[sun]),
        )
    }

    /// Check every average lies within `[0, 100]`.
    pub fn validate(&self) -> Result<(), AdmissionError> {
        let fields = [
            ("cpu_avg_pct_saturday", self.cpu_avg_pct_saturday),
            ("gpu_avg_pct_saturday", self.gpu_avg_pct_saturday),
            ("cpu_avg_pct_sunday", self.cpu_avg_pct_sunday),
            ("gpu_avg_pct_sunday", self.gpu_avg_pct_sunday),
        ];
        for (name, value) in fields {
            if !(0.0..=100.0).contains(&value) {
                return Err(AdmissionError::ForecastUnavailable(format!(
                    "{name} out of range: {value}"
                )));
            }
        }
        Ok(())
    }

    /// Averages for `day`. Weekdays report zero utilization.
    pub fn averages_for(&self, day: WindowDay) -> DayAverages {
        match day {
            WindowDay::Saturday => DayAverages {
                cpu_pct: self.cpu_avg_pct_saturday,
                gpu_pct: self.gpu_avg_pct_saturday,
            },
            WindowDay::Sunday => DayAverages {
                cpu_pct: self.cpu_avg_pct_sunday,
                gpu_pct: self.gpu_avg_pct_sunday,
            },
            WindowDay::Weekday => DayAverages::default(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Source of weekend utilization forecasts.
#[async_trait]
pub trait CapacityForecast: Send + Sync {
    /// Produce a fresh snapshot or fail with [`AdmissionError::ForecastUnavailable`].
    async fn refresh(&self) -> Result<ForecastSnapshot, AdmissionError>;
}
