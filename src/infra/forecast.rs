//! Forecast backends.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{AdmissionError, CapacityForecast, ForecastSnapshot};

/// Forecast whose snapshot is supplied from outside the process.
///
/// The snapshot can be swapped at any time (e.g. after an offline model run);
/// the controller picks it up on its next refresh. With no snapshot set,
/// refresh fails with [`AdmissionError::ForecastUnavailable`].
#[derive(Debug, Default)]
pub struct StaticForecast {
    snapshot: Mutex<Option<ForecastSnapshot>>,
}

impl StaticForecast {
    /// Forecast that always answers with `snapshot`.
    pub fn new(snapshot: ForecastSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }

    /// Forecast with nothing to report yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the published snapshot. `None` makes refreshes fail.
    pub fn publish(&self, snapshot: Option<ForecastSnapshot>) {
        *self.snapshot.lock() = snapshot;
    }
}

#[async_trait]
impl CapacityForecast for StaticForecast {
    async fn refresh(&self) -> Result<ForecastSnapshot, AdmissionError> {
        self.snapshot
            .lock()
            .ok_or_else(|| AdmissionError::ForecastUnavailable("no forecast published".into()))
    }
}
