//! Configuration file loading and error types.

use std::{fs, path::Path};

use crate::AgentConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format")]
    UnsupportedFormat,
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AgentConfig, ConfigError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" | "jsonc" => {
            let stripped = json_comments::StripComments::new(data.as_bytes());
            Ok(serde_json::from_reader(stripped)?)
        }
        "yaml" | "yml" => Ok(serde_yaml::from_str(&data)?),
        "toml" => Ok(toml::from_str(&data)?),
        _ => Err(ConfigError::UnsupportedFormat),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_tmp(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let file = write_tmp(
            ".toml",
            r#"
[panel]
url = "https://panel.example.com"
key = "secret"
node_id = 7
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.panel.node_id, 7);
        assert_eq!(config.panel.identity_field, "email");
        assert_eq!(config.intervals.reconcile_secs, 60);
        assert_eq!(config.intervals.traffic_secs, 360);
        assert_eq!(config.intervals.load_secs, 60);
        assert_eq!(config.intervals.quality_secs, 21_600);
        assert_eq!(config.timeouts.io_secs, 15);
        assert_eq!(config.proxy.config_path, "/etc/musync/users.json");
        assert!(config.proxy.restart_command.is_empty());
        assert!(config.quality.targets.is_empty());
    }

    #[test]
    fn full_toml() {
        let file = write_tmp(
            ".toml",
            r#"
[panel]
url = "https://panel.example.com"
key = "secret"
node_id = 7
identity_field = "id"

[proxy]
config_path = "/tmp/users.json"
stats_url = "http://127.0.0.1:10085/stats"
restart_command = ["systemctl", "restart", "proxy"]

[intervals]
reconcile_secs = 30
traffic_secs = 120
load_secs = 0
quality_secs = 3600

[timeouts]
io_secs = 5

[[quality.targets]]
name = "cdn"
download_url = "https://cdn.example.com/10MB.bin"
upload_url = "https://cdn.example.com/upload"

[logging]
level = "debug"
format = "json"

[metrics]
listen = "127.0.0.1:9100"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.panel.identity_field, "id");
        assert_eq!(config.proxy.restart_command, ["systemctl", "restart", "proxy"]);
        assert_eq!(config.intervals.reconcile_secs, 30);
        assert!(config.intervals.load().is_none());
        assert_eq!(config.timeouts.io_secs, 5);
        assert_eq!(config.quality.targets.len(), 1);
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(config.metrics.listen.as_deref(), Some("127.0.0.1:9100"));
    }

    #[test]
    fn json_with_comments() {
        let file = write_tmp(
            ".jsonc",
            r#"{
  // panel connection
  "panel": { "url": "https://p", "key": "k", "node_id": 1 },
  "intervals": { "traffic_secs": 90 }
}"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.intervals.traffic_secs, 90);
        assert_eq!(config.intervals.reconcile_secs, 60);
    }

    #[test]
    fn yaml() {
        let file = write_tmp(
            ".yaml",
            "panel:\n  url: https://p\n  key: k\n  node_id: 2\nproxy:\n  stats_url: http://127.0.0.1:1/stats\n",
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.panel.node_id, 2);
        assert_eq!(
            config.proxy.stats_url.as_deref(),
            Some("http://127.0.0.1:1/stats")
        );
    }

    #[test]
    fn unknown_extension_rejected() {
        let file = write_tmp(".ini", "panel=1");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat)
        ));
    }
}
