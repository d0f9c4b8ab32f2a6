//! Tests for builder modules

use std::sync::Arc;

use taskshift::builders::{build_controller, build_controller_with_source, build_task_source};
use taskshift::config::ControllerConfig;
use taskshift::core::{AdmissionError, ForecastSnapshot};
use taskshift::infra::task_source::RecordingDelay;
use taskshift::infra::{InMemoryTaskSource, StaticForecast};

const SAMPLE: &str = r#"{
    "topology": {
        "nodes": [{ "count": 2, "cpu": { "sockets": 1, "cores_per_cpu": 32 }, "gpu": { "count": 2 } }]
    },
    "task_source": { "base_url": "http://127.0.0.1:9/" },
    "schedule": { "tick_cron": "*/15 * * * Sat,Sun" }
}"#;

fn forecast() -> Arc<StaticForecast> {
    Arc::new(StaticForecast::new(
        ForecastSnapshot::new(10.0, 10.0, 10.0, 10.0).unwrap(),
    ))
}

#[test]
fn test_build_controller_with_source() {
    let cfg = ControllerConfig::from_json_str(SAMPLE).unwrap();
    let controller =
        build_controller_with_source(&cfg, forecast(), Arc::new(InMemoryTaskSource::new())).unwrap();
    assert_eq!(controller.topology().total_cpu_cores(), 64);
    assert_eq!(controller.topology().total_gpu_units(), 4);
    assert!(controller.status().queued.is_empty());
}

#[test]
fn test_build_task_source_validates_config() {
    let mut cfg = ControllerConfig::from_json_str(SAMPLE).unwrap();
    assert!(build_task_source(&cfg.task_source, Arc::new(RecordingDelay::new())).is_ok());

    cfg.task_source.base_url.clear();
    let err = build_task_source(&cfg.task_source, Arc::new(RecordingDelay::new())).err();
    assert!(matches!(err, Some(AdmissionError::Configuration(_))));
}

#[test]
fn test_build_controller_rejects_invalid_config() {
    let mut cfg = ControllerConfig::from_json_str(SAMPLE).unwrap();
    cfg.topology.nodes.clear();
    let err = build_controller_with_source(&cfg, forecast(), Arc::new(InMemoryTaskSource::new())).err();
    assert!(matches!(err, Some(AdmissionError::Configuration(_))));
}

#[tokio::test]
async fn test_build_controller_over_http() {
    let cfg = ControllerConfig::from_json_str(SAMPLE).unwrap();
    let controller = build_controller(&cfg, forecast()).unwrap();
    assert_eq!(controller.topology().total_cpu_cores(), 64);
}
