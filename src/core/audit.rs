//! Audit trail of admission decisions.
//!
//! Every refresh, launch, demotion and failure the controller makes is
//! recorded as an [`AuditEvent`] so operators can reconstruct what happened
//! during a weekend window.

use std::collections::VecDeque;

use serde::Serialize;

use crate::util::clock::now_ms;

/// What the controller did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Forecast snapshot replaced.
    Refresh,
    /// Forecast refresh failed; previous snapshot kept.
    RefreshFailed,
    /// Task launched.
    Admit,
    /// Task moved to the back of trial order.
    Demote,
    /// Previously launched task is now running.
    Confirm,
    /// Launch call failed after retries.
    LaunchFailed,
    /// Tick aborted before an admission decision.
    TickFailed,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier, if any.
    pub task_id: Option<String>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink keeping the most recent events.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event stamped with the current time.
pub fn build_audit_event(
    action: AuditAction,
    task_id: Option<&str>,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        task_id: task_id.map(str::to_string),
        action,
        created_at_ms: now_ms(),
        detail,
    }
}
