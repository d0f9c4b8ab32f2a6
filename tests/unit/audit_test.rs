//! Tests for audit sink

use taskshift::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(AuditAction::Admit, Some("job-1"), Some("cpu 10%".to_string()));
    sink.record(event.clone());

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].task_id.as_deref(), Some("job-1"));
    assert_eq!(events[0].action, AuditAction::Admit);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(AuditAction::Admit, Some("job-1"), None));
    sink.record(build_audit_event(AuditAction::Demote, Some("job-2"), None));
    sink.record(build_audit_event(AuditAction::Confirm, Some("job-3"), None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id.as_deref(), Some("job-2"));
    assert_eq!(events[1].task_id.as_deref(), Some("job-3"));
}

#[test]
fn test_zero_capacity_sink_drops_everything() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event(AuditAction::Refresh, None, None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let a = build_audit_event(AuditAction::RefreshFailed, None, Some("timeout".to_string()));
    let b = build_audit_event(AuditAction::RefreshFailed, None, None);

    assert_ne!(a.event_id, b.event_id);
    assert!(a.created_at_ms > 0);
    assert_eq!(a.task_id, None);

    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["action"], "refresh_failed");
    assert_eq!(json["detail"], "timeout");
}
