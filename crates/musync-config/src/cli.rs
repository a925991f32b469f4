//! CLI override definitions and application logic.

use clap::Parser;

use crate::AgentConfig;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override panel base URL
    #[arg(long)]
    pub panel_url: Option<String>,
    /// Override panel mu key
    #[arg(long)]
    pub panel_key: Option<String>,
    /// Override panel node id
    #[arg(long)]
    pub node_id: Option<u64>,
    /// Override proxy user-list path
    #[arg(long)]
    pub proxy_config_path: Option<String>,
    /// Override proxy stats endpoint
    #[arg(long)]
    pub proxy_stats_url: Option<String>,
    /// Override reconciliation period (seconds, 0 = disabled)
    #[arg(long)]
    pub reconcile_secs: Option<u64>,
    /// Override traffic accounting period (seconds, 0 = disabled)
    #[arg(long)]
    pub traffic_secs: Option<u64>,
    /// Override load report period (seconds, 0 = disabled)
    #[arg(long)]
    pub load_secs: Option<u64>,
    /// Override quality test period (seconds, 0 = disabled)
    #[arg(long)]
    pub quality_secs: Option<u64>,
    /// Override per-call I/O timeout (seconds)
    #[arg(long)]
    pub io_timeout_secs: Option<u64>,
    /// Override metrics listen address
    #[arg(long)]
    pub metrics_listen: Option<String>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut AgentConfig, overrides: &CliOverrides) {
    if let Some(v) = &overrides.panel_url {
        config.panel.url = v.clone();
    }
    if let Some(v) = &overrides.panel_key {
        config.panel.key = v.clone();
    }
    if let Some(v) = overrides.node_id {
        config.panel.node_id = v;
    }
    if let Some(v) = &overrides.proxy_config_path {
        config.proxy.config_path = v.clone();
    }
    if let Some(v) = &overrides.proxy_stats_url {
        config.proxy.stats_url = Some(v.clone());
    }
    if let Some(v) = overrides.reconcile_secs {
        config.intervals.reconcile_secs = v;
    }
    if let Some(v) = overrides.traffic_secs {
        config.intervals.traffic_secs = v;
    }
    if let Some(v) = overrides.load_secs {
        config.intervals.load_secs = v;
    }
    if let Some(v) = overrides.quality_secs {
        config.intervals.quality_secs = v;
    }
    if let Some(v) = overrides.io_timeout_secs {
        config.timeouts.io_secs = v;
    }
    if let Some(v) = &overrides.metrics_listen {
        config.metrics.listen = Some(v.clone());
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AgentConfig {
        toml::from_str(
            r#"
[panel]
url = "https://panel.example.com"
key = "k"
node_id = 1
"#,
        )
        .unwrap()
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = base();
        let overrides = CliOverrides {
            node_id: Some(9),
            traffic_secs: Some(0),
            log_level: Some("debug".into()),
            proxy_stats_url: Some("http://127.0.0.1:1/stats".into()),
            ..Default::default()
        };
        apply_overrides(&mut config, &overrides);
        assert_eq!(config.panel.node_id, 9);
        assert_eq!(config.intervals.traffic_secs, 0);
        assert_eq!(config.intervals.reconcile_secs, 60);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert!(config.proxy.stats_url.is_some());
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let mut config = base();
        apply_overrides(&mut config, &CliOverrides::default());
        assert_eq!(config.panel.url, "https://panel.example.com");
        assert_eq!(config.intervals.quality_secs, 21_600);
    }
}
