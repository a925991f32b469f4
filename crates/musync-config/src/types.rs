//! Configuration type definitions.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub panel: PanelConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub intervals: IntervalConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Remote panel connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Panel base URL, e.g. `https://panel.example.com`.
    pub url: String,
    /// Shared mu key sent with every request.
    pub key: String,
    /// Node id this agent serves.
    pub node_id: u64,
    /// User field used as the stable identity: `email` or `id`.
    #[serde(default = "default_identity_field")]
    pub identity_field: String,
    /// Method assigned to users the panel returns without one.
    #[serde(default = "default_method")]
    pub default_method: String,
}

/// Local proxy control settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Where the user list for the proxy is written.
    #[serde(default = "default_proxy_config_path")]
    pub config_path: String,
    /// JSON endpoint exposing per-user cumulative counters.
    /// Without it every user reads as (0, 0).
    #[serde(default)]
    pub stats_url: Option<String>,
    /// Command (program + args) that restarts the proxy. Empty = no restart.
    #[serde(default)]
    pub restart_command: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            config_path: default_proxy_config_path(),
            stats_url: None,
            restart_command: Vec::new(),
        }
    }
}

/// Periods of the four scheduled tasks, in seconds. `0` disables a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalConfig {
    #[serde(default = "default_reconcile_secs")]
    pub reconcile_secs: u64,
    #[serde(default = "default_traffic_secs")]
    pub traffic_secs: u64,
    #[serde(default = "default_load_secs")]
    pub load_secs: u64,
    #[serde(default = "default_quality_secs")]
    pub quality_secs: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            reconcile_secs: default_reconcile_secs(),
            traffic_secs: default_traffic_secs(),
            load_secs: default_load_secs(),
            quality_secs: default_quality_secs(),
        }
    }
}

impl IntervalConfig {
    pub fn reconcile(&self) -> Option<Duration> {
        period(self.reconcile_secs)
    }

    pub fn traffic(&self) -> Option<Duration> {
        period(self.traffic_secs)
    }

    pub fn load(&self) -> Option<Duration> {
        period(self.load_secs)
    }

    pub fn quality(&self) -> Option<Duration> {
        period(self.quality_secs)
    }
}

fn period(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Deadline for every single panel or proxy call.
    #[serde(default = "default_io_timeout_secs")]
    pub io_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            io_secs: default_io_timeout_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn io(&self) -> Duration {
        Duration::from_secs(self.io_secs)
    }
}

/// Bandwidth-quality probe targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default)]
    pub targets: Vec<QualityTargetConfig>,
    /// Deadline for one target's full measurement.
    #[serde(default = "default_quality_target_timeout_secs")]
    pub target_timeout_secs: u64,
    /// Payload size posted to `upload_url`.
    #[serde(default = "default_quality_upload_bytes")]
    pub upload_bytes: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            target_timeout_secs: default_quality_target_timeout_secs(),
            upload_bytes: default_quality_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityTargetConfig {
    pub name: String,
    pub download_url: String,
    #[serde(default)]
    pub upload_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"musync_panel": "debug", "hyper": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsConfig {
    /// Prometheus listener address, e.g. `127.0.0.1:9100`.
    pub listen: Option<String>,
}
