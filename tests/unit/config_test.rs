//! Tests for configuration validation

use taskshift::config::{
    ControllerConfig, CpuSpec, GpuSpec, NodeConfig, ScheduleConfig, TaskSourceConfig,
    TopologyConfig, ENV_HOST, ENV_TOKEN,
};

const SAMPLE: &str = r#"{
    "topology": {
        "nodes": [
            { "count": 4, "cpu": { "sockets": 2, "cores_per_cpu": 16 }, "gpu": { "count": 4 } },
            { "count": 10, "cpu": { "sockets": 2, "cores_per_cpu": 8 } }
        ]
    },
    "task_source": {
        "base_url": "http://taskmaster.local/api/"
    }
}"#;

fn task_source(base_url: &str) -> TaskSourceConfig {
    serde_json::from_value(serde_json::json!({ "base_url": base_url })).unwrap()
}

#[test]
fn test_topology_totals() {
    let topology = TopologyConfig {
        nodes: vec![
            NodeConfig {
                count: 4,
                cpu: CpuSpec {
                    sockets: 2,
                    cores_per_cpu: 16,
                },
                gpu: Some(GpuSpec { count: 4 }),
            },
            NodeConfig {
                count: 10,
                cpu: CpuSpec {
                    sockets: 2,
                    cores_per_cpu: 8,
                },
                gpu: None,
            },
        ],
    };
    assert_eq!(topology.totals().unwrap(), (288, 16));
    let built = topology.topology().unwrap();
    assert_eq!(built.total_cpu_cores(), 288);
    assert_eq!(built.total_gpu_units(), 16);
}

#[test]
fn test_topology_without_cores_is_rejected() {
    let empty = TopologyConfig { nodes: vec![] };
    assert!(empty.topology().is_err());
}

#[test]
fn test_topology_overflow_is_rejected() {
    let huge = TopologyConfig {
        nodes: vec![NodeConfig {
            count: u32::MAX,
            cpu: CpuSpec {
                sockets: 2,
                cores_per_cpu: 2,
            },
            gpu: None,
        }],
    };
    assert!(huge.totals().is_err());
}

#[test]
fn test_task_source_defaults() {
    let cfg = task_source("http://taskmaster.local/api/");
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.running_path, "job/?state=1");
    assert_eq!(cfg.pending_path, "pending/");
    assert_eq!(cfg.max_attempts, 10);
    assert_eq!(cfg.retry_delay().as_secs(), 6);
}

#[test]
fn test_task_source_requires_base_url() {
    assert!(task_source("  ").validate().is_err());

    let mut cfg = task_source("http://taskmaster.local/api/");
    cfg.max_attempts = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_credential_is_never_serialized() {
    let mut cfg = task_source("http://taskmaster.local/api/");
    cfg.credential = "secret".to_string();
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(!json.contains("secret"));
}

#[test]
fn test_schedule_validation() {
    let schedule = ScheduleConfig::default();
    assert!(schedule.validate().is_ok());
    assert_eq!(schedule.tick_cron, "0 */10 * * * Sat,Sun");
    assert_eq!(schedule.refresh_cron, "0 30 23 * * Fri");

    let five_fields = ScheduleConfig {
        tick_cron: "*/15 * * * Sat,Sun".to_string(),
        ..ScheduleConfig::default()
    };
    assert!(five_fields.validate().is_ok());

    let bad_tick = ScheduleConfig {
        tick_cron: "every ten minutes".to_string(),
        ..ScheduleConfig::default()
    };
    let err = bad_tick.validate().unwrap_err();
    assert!(err.contains("tick_cron"), "{err}");

    let bad_refresh = ScheduleConfig {
        refresh_cron: "0 30 25 * * Fri".to_string(),
        ..ScheduleConfig::default()
    };
    let err = bad_refresh.validate().unwrap_err();
    assert!(err.contains("refresh_cron"), "{err}");
}

#[test]
fn test_controller_config_from_json() {
    let cfg = ControllerConfig::from_json_str(SAMPLE).unwrap();
    assert_eq!(cfg.topology.totals().unwrap(), (288, 16));
    assert_eq!(cfg.schedule.tick_cron, "0 */10 * * * Sat,Sun");
    assert_eq!(cfg.schedule.refresh_cron, "0 30 23 * * Fri");

    let custom = SAMPLE.replacen(
        "\"task_source\"",
        "\"schedule\": { \"refresh_cron\": \"0 18 * * Thu\" },\n    \"task_source\"",
        1,
    );
    let cfg = ControllerConfig::from_json_str(&custom).unwrap();
    assert_eq!(cfg.schedule.refresh_cron, "0 18 * * Thu");
    assert_eq!(cfg.schedule.tick_cron, "0 */10 * * * Sat,Sun");

    let broken = SAMPLE.replacen(
        "\"task_source\"",
        "\"schedule\": { \"tick_cron\": \"soon\" },\n    \"task_source\"",
        1,
    );
    assert!(ControllerConfig::from_json_str(&broken).is_err());
}

#[test]
fn test_controller_config_rejects_bad_json() {
    assert!(ControllerConfig::from_json_str("{ not json").is_err());
    let without_host = SAMPLE.replace("http://taskmaster.local/api/", "");
    assert!(ControllerConfig::from_json_str(&without_host).is_err());
}

#[test]
fn test_environment_overrides_host_and_token() {
    let mut cfg = ControllerConfig::from_json_str(SAMPLE).unwrap();
    std::env::set_var(ENV_HOST, "http://other-host/api/");
    std::env::set_var(ENV_TOKEN, "token-from-env");
    cfg.apply_env();
    std::env::remove_var(ENV_HOST);
    std::env::remove_var(ENV_TOKEN);

    assert_eq!(cfg.task_source.base_url, "http://other-host/api/");
    assert_eq!(cfg.task_source.credential, "token-from-env");
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("taskshift-config-{}.json", std::process::id()));
    std::fs::write(&path, SAMPLE).unwrap();
    let loaded = ControllerConfig::load(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(loaded.is_ok());
    assert!(ControllerConfig::load(std::env::temp_dir().join("taskshift-missing.json")).is_err());
}
