//! Controller configuration structures.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AdmissionError, AppResult, ClusterTopology};
use crate::util::cron_expr::parse_cron;

/// Environment variable overriding [`TaskSourceConfig::base_url`].
pub const ENV_HOST: &str = "TASKMASTER_HOST";
/// Environment variable overriding [`TaskSourceConfig::credential`].
pub const ENV_TOKEN: &str = "TASKMASTER_TOKEN";

/// CPU layout of one node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuSpec {
    /// Sockets per node.
    pub sockets: u32,
    /// Cores per socket.
    pub cores_per_cpu: u32,
}

/// GPU layout of one node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuSpec {
    /// GPUs per node.
    pub count: u32,
}

/// A group of identical nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Number of nodes of this type.
    pub count: u32,
    /// CPU layout.
    pub cpu: CpuSpec,
    /// GPU layout, absent on CPU-only nodes.
    #[serde(default)]
    pub gpu: Option<GpuSpec>,
}

/// Cluster hardware inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Node groups.
    pub nodes: Vec<NodeConfig>,
}

impl TopologyConfig {
    /// Sum cores and GPUs over all node groups.
    pub fn totals(&self) -> Result<(u32, u32), String> {
        let mut cpu: u32 = 0;
        let mut gpu: u32 = 0;
        for node in &self.nodes {
            let cores = node
                .cpu
                .sockets
                .checked_mul(node.cpu.cores_per_cpu)
                .and_then(|c| c.checked_mul(node.count))
                .ok_or("cpu core count overflows")?;
            cpu = cpu.checked_add(cores).ok_or("cpu core count overflows")?;
            if let Some(g) = &node.gpu {
                let units = g.count.checked_mul(node.count).ok_or("gpu count overflows")?;
                gpu = gpu.checked_add(units).ok_or("gpu count overflows")?;
            }
        }
        Ok((cpu, gpu))
    }

    /// Build the validated topology.
    pub fn topology(&self) -> Result<ClusterTopology, AdmissionError> {
        let (cpu, gpu) = self.totals().map_err(AdmissionError::Configuration)?;
        ClusterTopology::new(cpu, gpu)
    }
}

fn default_running_path() -> String {
    "job/?state=1".into()
}

fn default_pending_path() -> String {
    "pending/".into()
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_retry_delay_secs() -> u64 {
    6
}

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Job system connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSourceConfig {
    /// Service root URL.
    #[serde(default)]
    pub base_url: String,
    /// Static credential sent with every request.
    #[serde(default, skip_serializing)]
    pub credential: String,
    /// Path listing running jobs.
    #[serde(default = "default_running_path")]
    pub running_path: String,
    /// Path listing deferred jobs.
    #[serde(default = "default_pending_path")]
    pub pending_path: String,
    /// Prefix the job id is appended to for launching.
    #[serde(default)]
    pub launch_path_prefix: String,
    /// Attempts per request before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Seconds between attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TaskSourceConfig {
    /// Validate connection settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err(format!("base_url must be set (or {ENV_HOST})"));
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Pause between retry attempts.
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Per-request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_tick_cron() -> String {
    "0 */10 * * * Sat,Sun".into()
}

fn default_refresh_cron() -> String {
    "0 30 23 * * Fri".into()
}

/// Trigger times for refreshes and ticks, as cron expressions in cluster-local
/// time. Five-field expressions are accepted and fire at second 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Weekend tick schedule.
    #[serde(default = "default_tick_cron")]
    pub tick_cron: String,
    /// Weekly forecast refresh schedule.
    #[serde(default = "default_refresh_cron")]
    pub refresh_cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_cron: default_tick_cron(),
            refresh_cron: default_refresh_cron(),
        }
    }
}

impl ScheduleConfig {
    /// Validate both cron expressions.
    pub fn validate(&self) -> Result<(), String> {
        parse_cron(&self.tick_cron).map_err(|e| format!("tick_cron: {e}"))?;
        parse_cron(&self.refresh_cron).map_err(|e| format!("refresh_cron: {e}"))?;
        Ok(())
    }
}

/// Root controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Cluster inventory.
    pub topology: TopologyConfig,
    /// Job system connection.
    pub task_source: TaskSourceConfig,
    /// Trigger times.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl ControllerConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.topology
            .topology()
            .map_err(|e| format!("topology invalid: {e}"))?;
        self.task_source
            .validate()
            .map_err(|e| format!("task_source invalid: {e}"))?;
        self.schedule
            .validate()
            .map_err(|e| format!("schedule invalid: {e}"))?;
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a JSON file, overlay the environment (including a `.env`
    /// file if present) and validate.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("no .env loaded: {}", e);
        }
        cfg.apply_env();
        cfg.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(cfg)
    }

    /// Take host and credential from the environment when set.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var(ENV_HOST) {
            if !host.trim().is_empty() {
                self.task_source.base_url = host;
            }
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            self.task_source.credential = token;
        }
    }
}
