//! Configuration validation logic.

use musync_core::MAX_INTERVAL_SECS;

use crate::AgentConfig;
use crate::loader::ConfigError;

const IDENTITY_FIELDS: [&str; 2] = ["email", "id"];

pub fn validate_config(config: &AgentConfig) -> Result<(), ConfigError> {
    let url = config.panel.url.trim();
    if url.is_empty() {
        return Err(ConfigError::Validation("panel.url is empty".into()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "panel.url must start with http:// or https://".into(),
        ));
    }
    if config.panel.key.trim().is_empty() {
        return Err(ConfigError::Validation("panel.key is empty".into()));
    }
    if !IDENTITY_FIELDS.contains(&config.panel.identity_field.as_str()) {
        return Err(ConfigError::Validation(format!(
            "panel.identity_field must be one of: {:?}",
            IDENTITY_FIELDS
        )));
    }
    if config.proxy.config_path.trim().is_empty() {
        return Err(ConfigError::Validation("proxy.config_path is empty".into()));
    }
    if let Some(stats) = &config.proxy.stats_url {
        if stats.trim().is_empty() {
            return Err(ConfigError::Validation("proxy.stats_url is empty".into()));
        }
    }
    let intervals = [
        ("reconcile_secs", config.intervals.reconcile_secs),
        ("traffic_secs", config.intervals.traffic_secs),
        ("load_secs", config.intervals.load_secs),
        ("quality_secs", config.intervals.quality_secs),
    ];
    for (name, secs) in intervals {
        if secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::Validation(format!(
                "intervals.{name} must be at most {MAX_INTERVAL_SECS} (got {secs})"
            )));
        }
    }
    if config.timeouts.io_secs == 0 {
        return Err(ConfigError::Validation("timeouts.io_secs must be > 0".into()));
    }
    for target in &config.quality.targets {
        if target.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "quality.targets: name is empty".into(),
            ));
        }
        if target.download_url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "quality.targets[{}]: download_url is empty",
                target.name
            )));
        }
    }
    if config.quality.target_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "quality.target_timeout_secs must be > 0".into(),
        ));
    }
    if let Some(listen) = &config.metrics.listen {
        if listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "metrics.listen is not a socket address: {listen}"
            )));
        }
    }
    if let Some(format) = &config.logging.format {
        if !["json", "pretty", "compact"].contains(&format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.format must be json, pretty or compact (got {format})"
            )));
        }
    }
    Ok(())
}
