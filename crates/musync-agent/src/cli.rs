//! CLI entry points for the agent.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use musync_config::{
    AgentConfig, CliOverrides, ConfigError, LoggingConfig, apply_overrides, load_config,
    validate_config,
};
use musync_panel::{HttpPanel, IdentityField};
use musync_probe::{HttpQualityProbe, QualityTarget, SystemLoadProbe};
use musync_proxy::ManagedProxy;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::agent::{Agent, Collaborators, Schedule};

/// CLI arguments for running the agent.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "musync-agent",
    version,
    about = "Keep a local proxy's users and traffic in sync with a remote panel"
)]
pub struct RunArgs {
    /// Config file path (TOML, YAML or JSON).
    #[arg(short, long, default_value = "agent.toml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// CLI arguments for checking a configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "musync-check", version, about = "Validate an agent configuration")]
pub struct CheckArgs {
    /// Config file path (TOML, YAML or JSON).
    #[arg(short, long, default_value = "agent.toml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Load a config file, apply CLI overrides and validate the result.
pub fn load_effective_config(
    path: &Path,
    overrides: &CliOverrides,
) -> Result<AgentConfig, ConfigError> {
    let mut config = load_config(path)?;
    apply_overrides(&mut config, overrides);
    validate_config(&config)?;
    Ok(config)
}

/// Run the agent with the given CLI arguments.
pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_effective_config(&args.config, &args.overrides)
        .map_err(|e| format!("failed to load config {:?}: {e}", args.config))?;

    init_tracing(&config.logging);

    if let Some(listen) = &config.metrics.listen {
        musync_metrics::init_prometheus(listen)?;
        info!(%listen, "prometheus exporter listening");
    }

    info!(
        version = musync_core::VERSION,
        panel_url = %config.panel.url,
        node_id = config.panel.node_id,
        "musync agent starting"
    );

    let collaborators = build_collaborators(&config)?;

    // Set up graceful shutdown on SIGTERM/SIGINT
    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    Agent::new(collaborators, Schedule::from_config(&config))
        .run(shutdown)
        .await;
    Ok(())
}

/// Validate a configuration and print the effective schedule.
pub fn check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_effective_config(&args.config, &args.overrides)
        .map_err(|e| format!("invalid config {:?}: {e}", args.config))?;
    let schedule = Schedule::from_config(&config);

    println!("{}: ok", args.config.display());
    println!("  panel      {} (node {})", config.panel.url, config.panel.node_id);
    println!("  identity   {}", config.panel.identity_field);
    println!("  user list  {}", config.proxy.config_path);
    println!("  reconcile  {}", describe(schedule.reconcile));
    println!("  traffic    {}", describe(schedule.traffic));
    println!("  load       {}", describe(schedule.load));
    println!("  quality    {}", describe(schedule.quality));
    println!("  io timeout {}s", schedule.io_timeout.as_secs());
    Ok(())
}

fn describe(period: Option<Duration>) -> String {
    match period {
        Some(p) => format!("every {}s", p.as_secs()),
        None => "disabled".to_string(),
    }
}

/// Build the HTTP panel, managed proxy and system probes from config.
pub fn build_collaborators(
    config: &AgentConfig,
) -> Result<Collaborators, Box<dyn std::error::Error>> {
    let identity: IdentityField = config.panel.identity_field.parse()?;
    let client = reqwest::Client::builder()
        .timeout(config.timeouts.io())
        .build()?;

    let panel = HttpPanel::with_client(
        client.clone(),
        &config.panel.url,
        &config.panel.key,
        config.panel.node_id,
    )
    .identity_field(identity)
    .default_method(&config.panel.default_method);

    let mut proxy = ManagedProxy::new(&config.proxy.config_path)
        .restart_command(config.proxy.restart_command.clone())
        .with_client(client);
    if let Some(url) = &config.proxy.stats_url {
        proxy = proxy.stats_url(url);
    }

    let targets = config
        .quality
        .targets
        .iter()
        .map(|t| QualityTarget {
            name: t.name.clone(),
            download_url: t.download_url.clone(),
            upload_url: t.upload_url.clone(),
        })
        .collect();
    let quality = HttpQualityProbe::new(
        targets,
        Duration::from_secs(config.quality.target_timeout_secs),
        config.quality.upload_bytes,
    );

    Ok(Collaborators {
        panel: Arc::new(panel),
        proxy: Arc::new(proxy),
        load: Arc::new(SystemLoadProbe::new()),
        quality: Arc::new(quality),
    })
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_tracing(config: &LoggingConfig) {
    // Build the env filter from base level and per-module filters
    let base_level = config
        .level
        .as_deref()
        .unwrap_or(musync_core::DEFAULT_LOG_LEVEL);
    let mut filter_str = base_level.to_string();

    for (module, level) in &config.filters {
        filter_str.push(',');
        filter_str.push_str(module);
        filter_str.push('=');
        filter_str.push_str(level);
    }

    let filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("info"));

    let format = config.format.as_deref().unwrap_or("pretty");
    let output = config.output.as_deref().unwrap_or("stderr");

    match (format, output) {
        ("json", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stdout))
                .init();
        }
        ("json", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        ("compact", "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stdout))
                .init();
        }
        ("compact", _) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        (_, "stdout") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stdout))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const AGENT_TOML: &str = r#"
[panel]
url = "https://panel.example.com"
key = "mu-key"
node_id = 7

[proxy]
config_path = "/tmp/musync-users.json"
stats_url = "http://127.0.0.1:9000/stats"

[intervals]
load_secs = 0
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn effective_config_applies_overrides() {
        let file = write_config(AGENT_TOML);
        let overrides = CliOverrides {
            traffic_secs: Some(30),
            ..Default::default()
        };
        let config = load_effective_config(file.path(), &overrides).unwrap();
        let schedule = Schedule::from_config(&config);
        assert_eq!(schedule.reconcile, Some(Duration::from_secs(60)));
        assert_eq!(schedule.traffic, Some(Duration::from_secs(30)));
        assert_eq!(schedule.load, None);
        assert_eq!(schedule.quality, Some(Duration::from_secs(21_600)));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let file = write_config(AGENT_TOML);
        let overrides = CliOverrides {
            panel_url: Some("ftp://panel".into()),
            ..Default::default()
        };
        assert!(matches!(
            load_effective_config(file.path(), &overrides),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn collaborators_build_from_valid_config() {
        let file = write_config(AGENT_TOML);
        let config = load_effective_config(file.path(), &CliOverrides::default()).unwrap();
        assert!(build_collaborators(&config).is_ok());
    }

    #[test]
    fn check_reports_invalid_file() {
        let args = CheckArgs {
            config: PathBuf::from("/nonexistent/agent.toml"),
            overrides: CliOverrides::default(),
        };
        assert!(check(args).is_err());
    }

    #[test]
    fn describe_periods() {
        assert_eq!(describe(None), "disabled");
        assert_eq!(describe(Some(Duration::from_secs(60))), "every 60s");
    }
}
