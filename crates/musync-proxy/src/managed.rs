//! Managed proxy controller.
//!
//! Holds the desired user set in memory, writes it to a JSON user list
//! for the proxy to load, restarts the proxy with an external command and
//! reads live counters from the proxy's JSON stats endpoint:
//!
//! ```json
//! { "email:alice@example.com": { "upload": 1024, "download": 4096 } }
//! ```
//!
//! Users missing from the stats read as `(0, 0)`, which is exactly what a
//! freshly restarted proxy reports.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use musync_core::{Counters, NodeInfo, UserId, UserRecord, UserSet};
use parking_lot::RwLock;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::ProxyError;
use crate::file::write_atomic;
use crate::traits::ProxyController;

#[derive(Debug, Default)]
struct State {
    users: UserSet,
    node: Option<NodeInfo>,
}

/// Controller for a proxy configured through a user-list file.
#[derive(Debug)]
pub struct ManagedProxy {
    config_path: PathBuf,
    stats_url: Option<String>,
    restart_command: Vec<String>,
    client: Client,
    state: RwLock<State>,
}

impl ManagedProxy {
    /// Create a controller writing its user list to `config_path`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            stats_url: None,
            restart_command: Vec::new(),
            client: Client::new(),
            state: RwLock::new(State::default()),
        }
    }

    /// Read live counters from this JSON endpoint.
    pub fn stats_url(mut self, url: impl Into<String>) -> Self {
        self.stats_url = Some(url.into());
        self
    }

    /// Program and arguments run by [`restart`](ProxyController::restart).
    pub fn restart_command(mut self, command: Vec<String>) -> Self {
        self.restart_command = command;
        self
    }

    /// Use a custom reqwest [`Client`] for stats requests.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn render(&self) -> Result<Vec<u8>, ProxyError> {
        let state = self.state.read();
        let file = wire::UserList {
            node: state.node.as_ref(),
            users: state
                .users
                .iter()
                .map(|u| wire::ConfiguredUser {
                    id: &u.id,
                    port: u.port,
                    method: &u.credential.method,
                    secret: &u.credential.secret,
                })
                .collect(),
        };
        Ok(serde_json::to_vec_pretty(&file)?)
    }

    async fn fetch_stats(&self, url: &str) -> Result<HashMap<String, Counters>, ProxyError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ProxyError::stats)?;
        if !resp.status().is_success() {
            return Err(ProxyError::Stats(format!(
                "HTTP {}",
                resp.status().as_u16()
            )));
        }
        resp.json().await.map_err(ProxyError::stats)
    }
}

#[async_trait]
impl ProxyController for ManagedProxy {
    async fn list_active_users(&self) -> Result<UserSet, ProxyError> {
        Ok(self.state.read().users.clone())
    }

    async fn add_user(&self, user: &UserRecord) -> Result<bool, ProxyError> {
        let mut state = self.state.write();
        if state.users.contains(user.id.as_str()) {
            debug!(user = %user.id, "add skipped, already configured");
            return Ok(false);
        }
        if let Some(holder) = state.users.by_port(user.port) {
            debug!(user = %user.id, port = user.port, holder = %holder.id, "add skipped, port taken");
            return Ok(false);
        }
        state.users.insert(user.clone());
        Ok(true)
    }

    async fn remove_user(&self, id: &UserId) -> Result<bool, ProxyError> {
        Ok(self.state.write().users.remove(id.as_str()).is_some())
    }

    async fn read_live_counters(&self, id: &UserId) -> Result<Counters, ProxyError> {
        let Some(url) = &self.stats_url else {
            return Ok(Counters::default());
        };
        let stats = self.fetch_stats(url).await?;
        Ok(stats.get(id.as_str()).copied().unwrap_or_default())
    }

    async fn read_counters(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<Result<Counters, ProxyError>>, ProxyError> {
        let stats = match &self.stats_url {
            Some(url) => self.fetch_stats(url).await?,
            None => HashMap::new(),
        };
        Ok(ids
            .iter()
            .map(|id| Ok(stats.get(id.as_str()).copied().unwrap_or_default()))
            .collect())
    }

    async fn apply_node_info(&self, node: &NodeInfo) -> Result<(), ProxyError> {
        self.state.write().node = Some(node.clone());
        Ok(())
    }

    async fn write_config(&self) -> Result<(), ProxyError> {
        let data = self.render()?;
        write_atomic(&self.config_path, &data).await
    }

    async fn restart(&self) -> Result<(), ProxyError> {
        let Some((program, args)) = self.restart_command.split_first() else {
            debug!("no restart command configured, skipping restart");
            return Ok(());
        };

        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProxyError::Restart(format!("failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProxyError::Restart(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        info!(program = %program, "proxy restarted");
        Ok(())
    }
}

mod wire {
    use musync_core::{NodeInfo, UserId};
    use serde::Serialize;

    #[derive(Serialize)]
    pub struct UserList<'a> {
        pub node: Option<&'a NodeInfo>,
        pub users: Vec<ConfiguredUser<'a>>,
    }

    #[derive(Serialize)]
    pub struct ConfiguredUser<'a> {
        pub id: &'a UserId,
        pub port: u16,
        pub method: &'a str,
        pub secret: &'a str,
    }
}
