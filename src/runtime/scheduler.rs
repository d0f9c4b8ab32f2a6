//! Periodic triggers driving the controller.
//!
//! Two loops run on tokio, each following a cron schedule:
//! - the weekly refresh loop (Friday 23:30 by default);
//! - the tick loop (every 10 minutes on Saturdays and Sundays by default).
//!
//! Ticks run inline in their loop, so they never overlap. Pausing only skips
//! future ticks; shutdown waits for an in-flight tick to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use cron::Schedule;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ScheduleConfig;
use crate::core::{AdmissionController, AdmissionError, TickOutcome};
use crate::runtime::tokio_spawner::TokioSpawner;
use crate::util::clock::{Clock, SystemClock};
use crate::util::cron_expr::{next_fire_after, parse_cron};

/// When the loops fire.
#[derive(Debug, Clone)]
pub struct Triggers {
    tick_expr: String,
    refresh_expr: String,
    tick: Schedule,
    refresh: Schedule,
}

impl Triggers {
    /// Parse the tick and refresh cron expressions.
    pub fn new(tick_cron: &str, refresh_cron: &str) -> Result<Self, AdmissionError> {
        Ok(Self {
            tick: parse_cron(tick_cron).map_err(AdmissionError::Configuration)?,
            refresh: parse_cron(refresh_cron).map_err(AdmissionError::Configuration)?,
            tick_expr: tick_cron.trim().to_string(),
            refresh_expr: refresh_cron.trim().to_string(),
        })
    }

    /// Validate and convert schedule configuration.
    pub fn from_config(cfg: &ScheduleConfig) -> Result<Self, AdmissionError> {
        Self::new(&cfg.tick_cron, &cfg.refresh_cron)
    }

    /// Next tick strictly after `now`.
    pub fn next_tick_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        next_fire_after(&self.tick, now)
    }

    /// Next forecast refresh strictly after `now`.
    pub fn next_refresh_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        next_fire_after(&self.refresh, now)
    }
}

/// Scheduler state reported to the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    /// Loops have been started and not shut down.
    pub running: bool,
    /// Ticks are paused.
    pub paused: bool,
    /// A tick is executing right now.
    pub tick_in_progress: bool,
    /// Next tick time; `None` while paused or stopped.
    pub next_scheduled_time: Option<NaiveDateTime>,
    /// Next forecast refresh time.
    pub next_refresh_time: Option<NaiveDateTime>,
}

/// Drives [`AdmissionController`] from weekly and weekend triggers.
pub struct WeekendScheduler {
    controller: Arc<AdmissionController>,
    triggers: Triggers,
    clock: Arc<dyn Clock>,
    paused: AtomicBool,
    running: AtomicBool,
    tick_in_progress: AtomicBool,
    next_tick: Mutex<Option<NaiveDateTime>>,
    next_refresh: Mutex<Option<NaiveDateTime>>,
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WeekendScheduler {
    /// Create a stopped scheduler using the system clock.
    pub fn new(controller: Arc<AdmissionController>, triggers: Triggers) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            controller,
            triggers,
            clock: Arc::new(SystemClock),
            paused: AtomicBool::new(false),
            running: AtomicBool::new(false),
            tick_in_progress: AtomicBool::new(false),
            next_tick: Mutex::new(None),
            next_refresh: Mutex::new(None),
            shutdown,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Replace the clock that decides when triggers fire.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Spawn both loops. Calling it again while running does nothing.
    pub fn start(self: &Arc<Self>, spawner: &TokioSpawner) {
        if self.running.swap(true, Ordering::AcqRel) {
            tracing::warn!("scheduler already running");
            return;
        }
        self.shutdown.send_replace(false);
        let refresh = spawner.spawn(Arc::clone(self).refresh_loop(self.shutdown.subscribe()));
        let ticks = spawner.spawn(Arc::clone(self).tick_loop(self.shutdown.subscribe()));
        self.handles.lock().extend([refresh, ticks]);
        tracing::info!(
            tick = %self.triggers.tick_expr,
            refresh = %self.triggers.refresh_expr,
            "weekend scheduler started"
        );
    }

    /// Stop both loops, waiting for an in-flight tick to finish.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("scheduler loop ended abnormally: {}", e);
            }
        }
        self.running.store(false, Ordering::Release);
        *self.next_tick.lock() = None;
        *self.next_refresh.lock() = None;
        tracing::info!("weekend scheduler stopped");
    }

    /// Skip future ticks. A tick already running completes.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        tracing::info!("admission ticks paused");
    }

    /// Resume ticking at the next slot.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        tracing::info!("admission ticks resumed");
    }

    /// Whether ticks are paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// The controller being driven.
    pub const fn controller(&self) -> &Arc<AdmissionController> {
        &self.controller
    }

    /// Current scheduler state.
    pub fn status(&self) -> SchedulerStatus {
        let paused = self.is_paused();
        let running = self.running.load(Ordering::Acquire);
        SchedulerStatus {
            running,
            paused,
            tick_in_progress: self.tick_in_progress.load(Ordering::Acquire),
            next_scheduled_time: if paused || !running {
                None
            } else {
                *self.next_tick.lock()
            },
            next_refresh_time: *self.next_refresh.lock(),
        }
    }

    async fn wait_until(
        &self,
        from: NaiveDateTime,
        target: NaiveDateTime,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        let wait = (target - from).to_std().unwrap_or_default();
        tokio::select! {
            () = tokio::time::sleep(wait) => true,
            _ = shutdown.wait_for(|stop| *stop) => false,
        }
    }

    async fn tick_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut last_fire = NaiveDateTime::MIN;
        loop {
            let now = self.clock.now().max(last_fire);
            let Some(next) = self.triggers.next_tick_after(now) else {
                tracing::warn!("tick schedule has no fire time after {}", now);
                break;
            };
            *self.next_tick.lock() = Some(next);
            if !self.wait_until(now, next, &mut shutdown).await {
                break;
            }
            last_fire = next;

            if self.is_paused() {
                tracing::debug!("tick at {} skipped: paused", next);
                continue;
            }

            self.tick_in_progress.store(true, Ordering::Release);
            let at = self.clock.now().max(next);
            match self.controller.tick(at).await {
                Ok(TickOutcome::Admitted { task_id }) => {
                    tracing::info!("tick at {} admitted {}", at, task_id);
                }
                Ok(outcome) => tracing::debug!("tick at {} finished: {:?}", at, outcome),
                Err(e) => tracing::warn!("tick at {} failed, retrying next slot: {}", at, e),
            }
            self.tick_in_progress.store(false, Ordering::Release);
        }
        tracing::debug!("tick loop stopped");
    }

    async fn refresh_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut last_fire = NaiveDateTime::MIN;
        loop {
            let now = self.clock.now().max(last_fire);
            let Some(next) = self.triggers.next_refresh_after(now) else {
                tracing::warn!("refresh schedule has no fire time after {}", now);
                break;
            };
            *self.next_refresh.lock() = Some(next);
            if !self.wait_until(now, next, &mut shutdown).await {
                break;
            }
            last_fire = next;

            let at = self.clock.now().max(next);
            if let Err(e) = self.controller.refresh_forecast_at(at).await {
                tracing::warn!("weekly refresh at {} failed, keeping previous forecast: {}", at, e);
            }
        }
        tracing::debug!("refresh loop stopped");
    }
}
