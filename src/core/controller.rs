//! Weekend admission controller.
//!
//! One [`AdmissionController::tick`] reconciles the candidate queue against
//! the job system, works out how much of each resource is free for the rest of
//! the weekend, and launches at most one task that fits.
//!
//! Availability is computed once per tick from the cached forecast (or the
//! operator override) and is not decremented as tasks start.
//!
//! All mutable state lives in one [`parking_lot::Mutex`]. The lock is never
//! held across a call to the forecast or task source ports.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use parking_lot::Mutex;
use serde::Serialize;

use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::forecast::{CapacityForecast, ForecastSnapshot};
use crate::core::queue::{ReconcileSummary, UniqueTaskQueue};
use crate::core::resource_override::{Resource, ResourceOverride};
use crate::core::task_source::TaskSource;
use crate::core::topology::ClusterTopology;
use crate::core::window::{next_monday_midnight, WindowDay};
use crate::core::{AdmissionError, Task, TaskId};
use crate::util::clock::{Clock, SystemClock};

/// Percentage of each resource free for opportunistic work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Availability {
    /// Free CPU percentage.
    pub cpu_pct: f64,
    /// Free GPU percentage.
    pub gpu_pct: f64,
}

/// Cached forecast together with the deadline computed when it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastWindow {
    /// Forecast averages.
    pub snapshot: ForecastSnapshot,
    /// Admitted tasks must be projected to finish before this.
    pub deadline: NaiveDateTime,
    /// When the snapshot was fetched.
    pub refreshed_at: NaiveDateTime,
}

/// Result of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickOutcome {
    /// A task was launched.
    Admitted {
        /// Launched task.
        task_id: TaskId,
    },
    /// Candidates were examined but none fit.
    NoFit {
        /// Number of candidates examined.
        examined: usize,
    },
    /// Nothing was pending.
    Idle,
    /// Another tick was already in progress.
    Skipped,
}

/// Why a candidate was or was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Fits every constraint.
    Fit,
    /// CPU share is not below the free CPU percentage.
    CpuExceeded,
    /// GPU share is not below the free GPU percentage.
    GpuExceeded,
    /// Would not finish before the deadline.
    PastDeadline,
}

/// Summary of the last completed tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Tick time.
    pub at: NaiveDateTime,
    /// What happened.
    pub outcome: TickOutcome,
    /// Availability the decision was based on.
    pub availability: Option<Availability>,
    /// Queue length after the tick.
    pub queue_len: usize,
}

/// Point-in-time view of the controller for the control surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerStatus {
    /// Cached forecast, if one has been fetched.
    pub forecast: Option<ForecastWindow>,
    /// Active operator ceilings.
    pub resource_override: ResourceOverride,
    /// Queued candidate ids in trial order.
    pub queued: Vec<TaskId>,
    /// Task launched by the previous tick and not yet confirmed.
    pub last_attempt: Option<TaskId>,
    /// Last completed tick.
    pub last_tick: Option<TickReport>,
    /// Failure of the most recent refresh or tick; cleared when one succeeds.
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct ControllerState {
    forecast: Option<ForecastWindow>,
    resource_override: ResourceOverride,
    queue: UniqueTaskQueue,
    last_attempt: Option<Task>,
    last_tick: Option<TickReport>,
    last_error: Option<String>,
}

impl ControllerState {
    fn availability(&self, now: NaiveDateTime) -> Option<Availability> {
        let window = self.forecast.as_ref()?;
        let averages = window.snapshot.averages_for(WindowDay::of(now));
        Some(Availability {
            cpu_pct: self
                .resource_override
                .effective(Resource::Cpu, 100.0 - averages.cpu_pct),
            gpu_pct: self
                .resource_override
                .effective(Resource::Gpu, 100.0 - averages.gpu_pct),
        })
    }
}

struct Selection {
    chosen: Option<Task>,
    examined: usize,
    availability: Availability,
    reconciled: ReconcileSummary,
    events: Vec<(AuditAction, TaskId, Option<String>)>,
}

/// Clears the in-progress flag when a tick ends, however it ends.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Greedy one-task-per-tick admission controller.
pub struct AdmissionController {
    topology: ClusterTopology,
    forecast: Arc<dyn CapacityForecast>,
    source: Arc<dyn TaskSource>,
    clock: Arc<dyn Clock>,
    state: Mutex<ControllerState>,
    ticking: AtomicBool,
    audit: Option<Arc<Mutex<dyn AuditSink>>>,
}

impl AdmissionController {
    /// Create a controller over the given ports using the system clock.
    pub fn new(
        topology: ClusterTopology,
        forecast: Arc<dyn CapacityForecast>,
        source: Arc<dyn TaskSource>,
    ) -> Self {
        Self {
            topology,
            forecast,
            source,
            clock: Arc::new(SystemClock),
            state: Mutex::new(ControllerState::default()),
            ticking: AtomicBool::new(false),
            audit: None,
        }
    }

    /// Replace the clock used by [`Self::refresh_forecast`].
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<Mutex<dyn AuditSink>>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Cluster totals this controller admits against.
    pub const fn topology(&self) -> &ClusterTopology {
        &self.topology
    }

    /// Current time according to the controller's clock.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Fetch a new forecast and recompute the deadline from the current time.
    pub async fn refresh_forecast(&self) -> Result<ForecastWindow, AdmissionError> {
        self.refresh_forecast_at(self.clock.now()).await
    }

    /// Fetch a new forecast and compute the deadline relative to `now`.
    ///
    /// On failure the previous snapshot and deadline stay in place and the
    /// error is returned and kept in [`ControllerStatus::last_error`].
    pub async fn refresh_forecast_at(
        &self,
        now: NaiveDateTime,
    ) -> Result<ForecastWindow, AdmissionError> {
        let fetched = self
            .forecast
            .refresh()
            .await
            .and_then(|snapshot| snapshot.validate().map(|()| snapshot))
            .map_err(|e| match e {
                AdmissionError::ForecastUnavailable(_) => e,
                other => AdmissionError::ForecastUnavailable(other.to_string()),
            });

        match fetched {
            Ok(snapshot) => {
                let window = ForecastWindow {
                    snapshot,
                    deadline: next_monday_midnight(now),
                    refreshed_at: now,
                };
                {
                    let mut state = self.state.lock();
                    state.forecast = Some(window);
                    state.last_error = None;
                }
                tracing::info!(
                    deadline = %window.deadline,
                    sat_cpu = snapshot.cpu_avg_pct_saturday,
                    sat_gpu = snapshot.gpu_avg_pct_saturday,
                    sun_cpu = snapshot.cpu_avg_pct_sunday,
                    sun_gpu = snapshot.gpu_avg_pct_sunday,
                    "forecast refreshed"
                );
                self.record(AuditAction::Refresh, None, Some(format!("deadline {}", window.deadline)));
                Ok(window)
            }
            Err(err) => {
                self.state.lock().last_error = Some(err.to_string());
                tracing::error!("forecast refresh failed, keeping previous snapshot: {}", err);
                self.record(AuditAction::RefreshFailed, None, Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Run one admission round at `now`.
    ///
    /// Returns [`TickOutcome::Skipped`] without touching state if another tick
    /// is still running.
    pub async fn tick(&self, now: NaiveDateTime) -> Result<TickOutcome, AdmissionError> {
        if self.ticking.swap(true, Ordering::AcqRel) {
            tracing::warn!("tick at {} skipped: previous tick still running", now);
            return Ok(TickOutcome::Skipped);
        }
        let _guard = TickGuard(&self.ticking);

        let result = self.run_tick(now).await;
        match &result {
            Ok(outcome) => {
                let mut state = self.state.lock();
                let report = TickReport {
                    at: now,
                    outcome: outcome.clone(),
                    availability: state.availability(now),
                    queue_len: state.queue.len(),
                };
                state.last_tick = Some(report);
                state.last_error = None;
            }
            Err(err) => {
                self.state.lock().last_error = Some(err.to_string());
                tracing::error!("tick at {} aborted: {}", now, err);
                self.record(AuditAction::TickFailed, None, Some(err.to_string()));
            }
        }
        result
    }

    async fn run_tick(&self, now: NaiveDateTime) -> Result<TickOutcome, AdmissionError> {
        let has_forecast = self.state.lock().forecast.is_some();
        if !has_forecast {
            tracing::info!("no forecast cached, refreshing before first tick");
            self.refresh_forecast_at(now).await?;
        }

        let running = self.source.list_running().await?;
        let pending = self.source.list_pending().await?;

        let selection = {
            let mut state = self.state.lock();
            self.select(&mut state, now, &running, &pending)?
        };
        for (action, task_id, detail) in selection.events {
            self.record(action, Some(&task_id), detail);
        }
        tracing::debug!(
            added = selection.reconciled.added,
            removed = selection.reconciled.removed,
            examined = selection.examined,
            cpu_available = selection.availability.cpu_pct,
            gpu_available = selection.availability.gpu_pct,
            "queue reconciled"
        );

        let Some(task) = selection.chosen else {
            if selection.examined == 0 {
                tracing::debug!("no pending tasks");
                return Ok(TickOutcome::Idle);
            }
            tracing::info!("{} candidates examined, none fit", selection.examined);
            return Ok(TickOutcome::NoFit {
                examined: selection.examined,
            });
        };

        match self.source.launch(&task.id).await {
            Ok(()) => {
                tracing::info!(
                    task_id = %task.id,
                    cpu = task.cpu_cores,
                    gpu = task.gpu_units,
                    time_limit_minutes = task.time_limit_minutes,
                    "task launched"
                );
                self.record(AuditAction::Admit, Some(&task.id), None);
                let task_id = task.id.clone();
                self.state.lock().last_attempt = Some(task);
                Ok(TickOutcome::Admitted { task_id })
            }
            Err(err) => {
                tracing::error!("launch of {} failed: {}", task.id, err);
                self.record(AuditAction::LaunchFailed, Some(&task.id), Some(err.to_string()));
                self.state.lock().queue.offer(task);
                Err(err)
            }
        }
    }

    fn select(
        &self,
        state: &mut ControllerState,
        now: NaiveDateTime,
        running: &HashSet<TaskId>,
        pending: &HashMap<TaskId, Task>,
    ) -> Result<Selection, AdmissionError> {
        let mut events = Vec::new();

        if let Some(last) = state.last_attempt.take() {
            if pending.contains_key(&last.id) {
                tracing::warn!("task {} still pending after launch, demoting", last.id);
                events.push((AuditAction::Demote, last.id.clone(), Some("launch not started".into())));
                state.queue.offer(last);
            } else if running.contains(&last.id) {
                tracing::info!("task {} confirmed running", last.id);
                events.push((AuditAction::Confirm, last.id, None));
            }
        }

        let reconciled = state.queue.reconcile(pending);

        let (availability, deadline) = match (state.availability(now), state.forecast.as_ref()) {
            (Some(availability), Some(window)) => (availability, window.deadline),
            _ => {
                return Err(AdmissionError::ForecastUnavailable(
                    "no forecast snapshot cached".into(),
                ))
            }
        };

        let mut examined = 0;
        let mut chosen = None;
        for _ in 0..state.queue.len() {
            let Ok(task) = state.queue.take_next() else {
                break;
            };
            examined += 1;
            let verdict = self.evaluate(&task, availability, now, deadline);
            if verdict == Verdict::Fit {
                chosen = Some(task);
                break;
            }
            tracing::debug!("task {} does not fit ({:?}), demoting", task.id, verdict);
            state.queue.offer(task);
        }

        Ok(Selection {
            chosen,
            examined,
            availability,
            reconciled,
            events,
        })
    }

    /// Check `task` against availability and the deadline.
    pub fn evaluate(
        &self,
        task: &Task,
        availability: Availability,
        now: NaiveDateTime,
        deadline: NaiveDateTime,
    ) -> Verdict {
        let share = self.topology.share_of(task);
        if share.cpu_pct >= availability.cpu_pct {
            return Verdict::CpuExceeded;
        }
        if share.gpu_pct.is_nan() || share.gpu_pct >= availability.gpu_pct {
            return Verdict::GpuExceeded;
        }
        let finish = i64::try_from(task.time_limit_minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .and_then(|limit| now.checked_add_signed(limit));
        match finish {
            Some(finish) if finish < deadline => Verdict::Fit,
            _ => Verdict::PastDeadline,
        }
    }

    /// Availability a tick at `now` would use, if a forecast is cached.
    pub fn availability_at(&self, now: NaiveDateTime) -> Option<Availability> {
        self.state.lock().availability(now)
    }

    /// Active operator ceilings.
    pub fn get_override(&self) -> ResourceOverride {
        self.state.lock().resource_override
    }

    /// Set ceilings for the supplied resources; omitted ones are unchanged.
    pub fn set_override(
        &self,
        cpu_ceiling_pct: Option<f64>,
        gpu_ceiling_pct: Option<f64>,
    ) -> Result<ResourceOverride, AdmissionError> {
        let updated = {
            let mut state = self.state.lock();
            state.resource_override.apply(cpu_ceiling_pct, gpu_ceiling_pct)?;
            state.resource_override
        };
        tracing::info!(
            "resource overrides updated: cpu={:?}, gpu={:?}",
            updated.cpu_ceiling_pct,
            updated.gpu_ceiling_pct
        );
        Ok(updated)
    }

    /// Remove every ceiling.
    pub fn clear_override(&self) {
        self.state.lock().resource_override.clear();
        tracing::info!("resource overrides reset to forecast");
    }

    /// Remove the ceiling for one resource.
    pub fn clear_override_for(&self, resource: Resource) -> ResourceOverride {
        let updated = {
            let mut state = self.state.lock();
            state.resource_override.clear_for(resource);
            state.resource_override
        };
        tracing::info!("{} override reset to forecast", resource);
        updated
    }

    /// Snapshot of controller state.
    pub fn status(&self) -> ControllerStatus {
        let state = self.state.lock();
        ControllerStatus {
            forecast: state.forecast,
            resource_override: state.resource_override,
            queued: state.queue.ids(),
            last_attempt: state.last_attempt.as_ref().map(|t| t.id.clone()),
            last_tick: state.last_tick.clone(),
            last_error: state.last_error.clone(),
        }
    }

    fn record(&self, action: AuditAction, task_id: Option<&str>, detail: Option<String>) {
        if let Some(audit) = &self.audit {
            audit.lock().record(build_audit_event(action, task_id, detail));
        }
    }
}
