//! Tests for the operator API surface

use std::sync::Arc;

use taskshift::core::{AdmissionController, ClusterTopology, ForecastSnapshot, Resource};
use taskshift::infra::{InMemoryTaskSource, StaticForecast};
use taskshift::runtime::api::{self, OverrideRequest};
use taskshift::config::ScheduleConfig;
use taskshift::runtime::{Triggers, WeekendScheduler};

fn scheduler() -> WeekendScheduler {
    let controller = AdmissionController::new(
        ClusterTopology::new(64, 8).unwrap(),
        Arc::new(StaticForecast::new(
            ForecastSnapshot::new(80.0, 90.0, 70.0, 60.0).unwrap(),
        )),
        Arc::new(InMemoryTaskSource::new()),
    );
    WeekendScheduler::new(
        Arc::new(controller),
        Triggers::from_config(&ScheduleConfig::default()).unwrap(),
    )
}

#[test]
fn test_override_round_trip() {
    let scheduler = scheduler();
    let controller = scheduler.controller();

    let empty = api::get_override(controller);
    assert_eq!(empty.override_cpu, None);
    assert_eq!(empty.override_gpu, None);

    let req: OverrideRequest = serde_json::from_str(r#"{"cpu": 100}"#).unwrap();
    let updated = api::set_override(controller, req).unwrap();
    assert_eq!(updated.override_cpu, Some(100.0));
    assert_eq!(updated.override_gpu, None);

    let updated = api::set_override(
        controller,
        OverrideRequest {
            cpu: None,
            gpu: Some(25.0),
        },
    )
    .unwrap();
    assert_eq!(updated.override_cpu, Some(100.0));
    assert_eq!(updated.override_gpu, Some(25.0));

    let partial = api::reset_override(controller, Some(Resource::Cpu));
    assert_eq!(partial.override_cpu, None);
    assert_eq!(partial.override_gpu, Some(25.0));

    let cleared = api::reset_override(controller, None);
    assert_eq!(cleared.override_gpu, None);
}

#[test]
fn test_out_of_range_override_is_rejected() {
    let scheduler = scheduler();
    let err = api::set_override(
        scheduler.controller(),
        OverrideRequest {
            cpu: Some(-1.0),
            gpu: None,
        },
    )
    .unwrap_err();
    assert!(err.error.contains("invalid override"));
    assert_eq!(api::get_override(scheduler.controller()).override_cpu, None);
}

#[test]
fn test_enable_disable() {
    let scheduler = scheduler();

    let disabled = api::disable(&scheduler);
    assert!(disabled.paused);
    assert!(scheduler.is_paused());
    assert_eq!(api::disable(&scheduler).message, "admission ticks already disabled");

    let enabled = api::enable(&scheduler);
    assert!(!enabled.paused);
    assert!(!scheduler.is_paused());
    assert_eq!(api::enable(&scheduler).message, "admission ticks already enabled");
}

#[test]
fn test_status_of_stopped_scheduler() {
    let scheduler = scheduler();
    let status = api::status(&scheduler);
    assert!(!status.scheduler.running);
    assert_eq!(status.scheduler.next_scheduled_time, None);
    assert!(status.controller.forecast.is_none());

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["scheduler"]["paused"], false);
    assert!(json["controller"]["queued"].as_array().unwrap().is_empty());
}

#[test]
fn test_health() {
    assert!(api::health().ok);
}
