//! HTTP panel client for SSPanel-style `mod_mu` APIs.
//!
//! Every request carries the shared mu key as a `key` query parameter and
//! every response is wrapped in `{ "ret": 1, "data": ... }`. A `ret` other
//! than `1` is a refusal: an error for fetches, a negative ack for reports.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use musync_panel::HttpPanel;
//!
//! let client = reqwest::Client::builder()
//!     .timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//! let panel = HttpPanel::with_client(client, "https://panel.example.com", "mu-key", 7);
//! ```

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use musync_core::{
    Credential, HostLoad, NodeInfo, QualityReport, TrafficDelta, UserId, UserRecord, UserSet,
};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{PanelClient, PanelError};

// ── IdentityField ─────────────────────────────────────────────────

/// Which panel user field becomes the stable [`UserId`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityField {
    /// `email:<address>` (default).
    #[default]
    Email,
    /// `id:<numeric id>`.
    Id,
}

impl IdentityField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Id => "id",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityField {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "id" => Ok(Self::Id),
            other => Err(PanelError::Rejected(format!(
                "unknown identity field: {other}"
            ))),
        }
    }
}

// ── HttpPanel ─────────────────────────────────────────────────────

/// Panel client speaking the `mod_mu` HTTP API.
#[derive(Debug)]
pub struct HttpPanel {
    client: Client,
    base: String,
    key: String,
    node_id: u64,
    identity: IdentityField,
    default_method: String,
}

impl HttpPanel {
    /// Create a new panel client.
    ///
    /// `base_url` is the panel root (e.g. `https://panel.example.com`).
    pub fn new(base_url: impl Into<String>, key: impl Into<String>, node_id: u64) -> Self {
        Self::with_client(Client::new(), base_url, key, node_id)
    }

    /// Create with a custom reqwest [`Client`] (for timeouts, proxies, etc.).
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        key: impl Into<String>,
        node_id: u64,
    ) -> Self {
        let base = base_url.into();
        Self {
            client,
            base: base.trim_end_matches('/').to_owned(),
            key: key.into(),
            node_id,
            identity: IdentityField::default(),
            default_method: musync_core::DEFAULT_METHOD.to_owned(),
        }
    }

    /// Choose the field user identities are built from.
    pub fn identity_field(mut self, field: IdentityField) -> Self {
        self.identity = field;
        self
    }

    /// Method for users the panel returns without one.
    pub fn default_method(mut self, method: impl Into<String>) -> Self {
        self.default_method = method.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// GET and unwrap the envelope; `ret != 1` is an error.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PanelError> {
        let resp = self
            .client
            .get(self.url(path))
            .query(&[("key", self.key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(PanelError::request)?;

        let envelope: wire::Envelope<T> = decode(resp).await?;
        if envelope.ret != 1 {
            return Err(PanelError::Rejected(
                envelope.msg.unwrap_or_else(|| format!("ret={}", envelope.ret)),
            ));
        }
        envelope
            .data
            .ok_or_else(|| PanelError::Decode("missing data".to_string()))
    }

    /// POST a JSON body; returns whether the panel acknowledged it.
    async fn post<B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<bool, PanelError> {
        let resp = self
            .client
            .post(self.url(path))
            .query(&[("key", self.key.as_str())])
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(PanelError::request)?;

        let envelope: wire::Envelope<serde_json::Value> = decode(resp).await?;
        if envelope.ret != 1 {
            debug!(path, ret = envelope.ret, msg = ?envelope.msg, "panel did not acknowledge report");
        }
        Ok(envelope.ret == 1)
    }

    fn node_query(&self) -> [(&'static str, String); 1] {
        [("node_id", self.node_id.to_string())]
    }

    fn to_record(&self, user: wire::User) -> UserRecord {
        let id = match self.identity {
            IdentityField::Email => UserId::prefixed("email", &user.email),
            IdentityField::Id => UserId::prefixed("id", user.id),
        };
        let method = user
            .method
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.default_method.clone());
        let used = user.u.saturating_add(user.d);
        let under_limit = user.transfer_enable == 0 || used < user.transfer_enable;
        UserRecord {
            id,
            panel_id: user.id,
            credential: Credential::new(method, user.passwd),
            port: user.port,
            available: user.enable.is_set() && under_limit,
            upload: user.u,
            download: user.d,
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, PanelError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(PanelError::Status(status.as_u16()));
    }
    resp.json().await.map_err(PanelError::decode)
}

#[async_trait]
impl PanelClient for HttpPanel {
    async fn fetch_node_info(&self) -> Result<NodeInfo, PanelError> {
        let path = format!("/mod_mu/nodes/{}/info", self.node_id);
        let node: wire::Node = self.get(&path, &[]).await?;
        Ok(NodeInfo {
            node_id: self.node_id,
            name: node.name,
            server: node.server,
            traffic_rate: node.traffic_rate,
            speed_limit_mbps: node.node_speedlimit,
            sort: node.sort,
        })
    }

    async fn fetch_declared_users(&self, node: &NodeInfo) -> Result<UserSet, PanelError> {
        let query = [("node_id", node.node_id.to_string())];
        let users: Vec<wire::User> = self.get("/mod_mu/users", &query).await?;

        let mut set = UserSet::new();
        for user in users {
            let record = self.to_record(user);
            if let Some(prev) = set.insert(record) {
                warn!(user = %prev.id, "panel returned duplicate identity, keeping the last one");
            }
        }
        debug!(count = set.len(), "fetched declared users");
        Ok(set)
    }

    async fn report_traffic(
        &self,
        user: &UserRecord,
        delta: TrafficDelta,
    ) -> Result<bool, PanelError> {
        let body = wire::TrafficReport {
            data: vec![wire::TrafficEntry {
                user_id: user.panel_id,
                u: delta.upload,
                d: delta.download,
            }],
        };
        self.post("/mod_mu/users/traffic", &self.node_query(), &body)
            .await
    }

    async fn report_online_count(&self, count: usize) -> Result<bool, PanelError> {
        let path = format!("/mod_mu/nodes/{}/online", self.node_id);
        self.post(&path, &[], &wire::OnlineReport { count }).await
    }

    async fn report_load(&self, load: &HostLoad) -> Result<bool, PanelError> {
        let path = format!("/mod_mu/nodes/{}/info", self.node_id);
        let body = wire::LoadReport {
            uptime: load.uptime_secs,
            load: load.load_string(),
        };
        self.post(&path, &[], &body).await
    }

    async fn report_quality(&self, report: &QualityReport) -> Result<bool, PanelError> {
        let body = wire::QualityReportBody {
            data: &report.samples,
        };
        self.post("/mod_mu/func/speedtest", &self.node_query(), &body)
            .await
    }
}

// ── Wire types ────────────────────────────────────────────────────

mod wire {
    use musync_core::QualitySample;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize)]
    pub struct Envelope<T> {
        pub ret: i64,
        pub data: Option<T>,
        #[serde(default)]
        pub msg: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Node {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub server: String,
        #[serde(default = "one")]
        pub traffic_rate: f64,
        #[serde(default)]
        pub node_speedlimit: u64,
        #[serde(default)]
        pub sort: u32,
    }

    fn one() -> f64 {
        1.0
    }

    #[derive(Debug, Deserialize)]
    pub struct User {
        pub id: u64,
        #[serde(default)]
        pub email: String,
        pub passwd: String,
        #[serde(default)]
        pub method: Option<String>,
        pub port: u16,
        #[serde(default = "Flag::enabled")]
        pub enable: Flag,
        #[serde(default)]
        pub u: u64,
        #[serde(default)]
        pub d: u64,
        #[serde(default)]
        pub transfer_enable: u64,
    }

    /// Panels disagree on whether flags are booleans or 0/1.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum Flag {
        Bool(bool),
        Int(i64),
    }

    impl Flag {
        fn enabled() -> Self {
            Self::Bool(true)
        }

        pub fn is_set(&self) -> bool {
            match self {
                Self::Bool(b) => *b,
                Self::Int(i) => *i != 0,
            }
        }
    }

    #[derive(Debug, Serialize)]
    pub struct TrafficReport {
        pub data: Vec<TrafficEntry>,
    }

    #[derive(Debug, Serialize)]
    pub struct TrafficEntry {
        pub user_id: u64,
        pub u: u64,
        pub d: u64,
    }

    #[derive(Debug, Serialize)]
    pub struct OnlineReport {
        pub count: usize,
    }

    #[derive(Debug, Serialize)]
    pub struct LoadReport {
        pub uptime: u64,
        pub load: String,
    }

    #[derive(Debug, Serialize)]
    pub struct QualityReportBody<'a> {
        pub data: &'a [QualitySample],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(field: IdentityField) -> HttpPanel {
        HttpPanel::new("https://panel.example.com/", "k", 3).identity_field(field)
    }

    fn wire_user(json: serde_json::Value) -> wire::User {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        assert_eq!(
            panel(IdentityField::Email).url("/mod_mu/users"),
            "https://panel.example.com/mod_mu/users"
        );
    }

    #[test]
    fn identity_field_parse() {
        assert_eq!("email".parse::<IdentityField>().unwrap(), IdentityField::Email);
        assert_eq!("id".parse::<IdentityField>().unwrap(), IdentityField::Id);
        assert!("uuid".parse::<IdentityField>().is_err());
    }

    #[test]
    fn record_identity_and_method() {
        let user = wire_user(serde_json::json!({
            "id": 12, "email": "a@example.com", "passwd": "pw", "port": 10012,
            "enable": 1, "u": 5, "d": 6, "transfer_enable": 0
        }));
        let record = panel(IdentityField::Email).to_record(user);
        assert_eq!(record.id.as_str(), "email:a@example.com");
        assert_eq!(record.panel_id, 12);
        assert_eq!(record.credential.method, musync_core::DEFAULT_METHOD);
        assert!(record.available);
        assert_eq!((record.upload, record.download), (5, 6));

        let user = wire_user(serde_json::json!({
            "id": 12, "passwd": "pw", "port": 10012, "method": "chacha20-ietf-poly1305"
        }));
        let record = panel(IdentityField::Id).to_record(user);
        assert_eq!(record.id.as_str(), "id:12");
        assert_eq!(record.credential.method, "chacha20-ietf-poly1305");
    }

    #[test]
    fn availability_follows_enable_and_quota() {
        let p = panel(IdentityField::Id);

        let disabled = wire_user(serde_json::json!({
            "id": 1, "passwd": "pw", "port": 1, "enable": false
        }));
        assert!(!p.to_record(disabled).available);

        let over_quota = wire_user(serde_json::json!({
            "id": 1, "passwd": "pw", "port": 1, "enable": 1,
            "u": 600, "d": 400, "transfer_enable": 1000
        }));
        assert!(!p.to_record(over_quota).available);

        let under_quota = wire_user(serde_json::json!({
            "id": 1, "passwd": "pw", "port": 1, "enable": 1,
            "u": 600, "d": 399, "transfer_enable": 1000
        }));
        assert!(p.to_record(under_quota).available);
    }

    #[test]
    fn envelope_without_data_decodes() {
        let env: wire::Envelope<wire::Node> =
            serde_json::from_value(serde_json::json!({"ret": 0, "msg": "node not found"}))
                .unwrap();
        assert_eq!(env.ret, 0);
        assert!(env.data.is_none());
        assert_eq!(env.msg.as_deref(), Some("node not found"));

        let env: wire::Envelope<Vec<wire::User>> =
            serde_json::from_value(serde_json::json!({"ret": 1})).unwrap();
        assert!(env.data.is_none());
        assert!(env.msg.is_none());
    }

    #[test]
    fn envelope_with_node_decodes() {
        let env: wire::Envelope<wire::Node> = serde_json::from_value(serde_json::json!({
            "ret": 1,
            "data": {"name": "hk-1", "server": "hk.example.com", "traffic_rate": 1.5}
        }))
        .unwrap();
        let node = env.data.unwrap();
        assert_eq!(node.name, "hk-1");
        assert_eq!(node.traffic_rate, 1.5);
    }
}
