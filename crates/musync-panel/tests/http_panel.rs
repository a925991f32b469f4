//! HttpPanel against an in-process mock panel.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use musync_core::{HostLoad, QualityReport, QualitySample, TrafficDelta};
use musync_panel::{HttpPanel, IdentityField, PanelClient, PanelError};
use parking_lot::Mutex;
use serde_json::{Value, json};

const KEY: &str = "mu-key";

#[derive(Clone, Default)]
struct MockPanel {
    posts: Arc<Mutex<Vec<(String, Value)>>>,
    refuse_traffic: Arc<AtomicBool>,
}

impl MockPanel {
    fn posts(&self, path: &str) -> Vec<Value> {
        self.posts
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

fn authorized(q: &HashMap<String, String>) -> bool {
    q.get("key").map(String::as_str) == Some(KEY)
}

async fn node_info(
    Path(id): Path<u64>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if !authorized(&q) {
        return Json(json!({"ret": 0, "msg": "bad key"}));
    }
    Json(json!({
        "ret": 1,
        "data": {
            "name": format!("node-{id}"),
            "server": "node.example.com",
            "traffic_rate": 1.5,
            "node_speedlimit": 100,
            "sort": 0
        }
    }))
}

async fn users(Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    if !authorized(&q) || q.get("node_id").map(String::as_str) != Some("7") {
        return Json(json!({"ret": 0, "msg": "bad query"}));
    }
    Json(json!({
        "ret": 1,
        "data": [
            {"id": 1, "email": "a@example.com", "passwd": "pa", "method": "aes-128-gcm",
             "port": 10001, "enable": 1, "u": 10, "d": 20, "transfer_enable": 0},
            {"id": 2, "email": "b@example.com", "passwd": "pb", "port": 10002,
             "enable": 0, "u": 0, "d": 0, "transfer_enable": 0}
        ]
    }))
}

async fn record(
    State(mock): State<MockPanel>,
    path: axum::http::Uri,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let path = path.path().to_owned();
    let refuse = path.ends_with("/users/traffic") && mock.refuse_traffic.load(Ordering::SeqCst);
    mock.posts.lock().push((path, body));
    if refuse {
        Json(json!({"ret": 0, "msg": "try later"}))
    } else {
        Json(json!({"ret": 1, "data": "ok"}))
    }
}

async fn broken() -> impl IntoResponse {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_mock() -> (SocketAddr, MockPanel) {
    let mock = MockPanel::default();
    let app = Router::new()
        .route("/mod_mu/nodes/{id}/info", get(node_info).post(record))
        .route("/mod_mu/nodes/{id}/online", post(record))
        .route("/mod_mu/users", get(users))
        .route("/mod_mu/users/traffic", post(record))
        .route("/mod_mu/func/speedtest", post(record))
        .route("/broken/mod_mu/nodes/{id}/info", get(broken))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, mock)
}

#[tokio::test]
async fn fetch_node_and_users() {
    let (addr, _mock) = spawn_mock().await;
    let panel = HttpPanel::new(format!("http://{addr}"), KEY, 7);

    let node = panel.fetch_node_info().await.unwrap();
    assert_eq!(node.node_id, 7);
    assert_eq!(node.name, "node-7");
    assert_eq!(node.speed_limit_mbps, 100);

    let users = panel.fetch_declared_users(&node).await.unwrap();
    assert_eq!(users.len(), 2);
    let a = users.get("email:a@example.com").unwrap();
    assert_eq!(a.panel_id, 1);
    assert_eq!(a.port, 10001);
    assert_eq!(a.credential.method, "aes-128-gcm");
    assert!(a.available);
    assert!(!users.get("email:b@example.com").unwrap().available);
}

#[tokio::test]
async fn identity_by_id() {
    let (addr, _mock) = spawn_mock().await;
    let panel = HttpPanel::new(format!("http://{addr}"), KEY, 7).identity_field(IdentityField::Id);
    let node = panel.fetch_node_info().await.unwrap();
    let users = panel.fetch_declared_users(&node).await.unwrap();
    assert!(users.contains("id:1"));
    assert!(users.contains("id:2"));
}

#[tokio::test]
async fn wrong_key_is_rejected() {
    let (addr, _mock) = spawn_mock().await;
    let panel = HttpPanel::new(format!("http://{addr}"), "nope", 7);
    let err = panel.fetch_node_info().await.unwrap_err();
    assert!(matches!(err, PanelError::Rejected(ref msg) if msg == "bad key"));
}

#[tokio::test]
async fn http_error_status() {
    let (addr, _mock) = spawn_mock().await;
    let panel = HttpPanel::new(format!("http://{addr}/broken"), KEY, 7);
    assert!(matches!(
        panel.fetch_node_info().await,
        Err(PanelError::Status(500))
    ));
}

#[tokio::test]
async fn unreachable_panel() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let panel = HttpPanel::new(format!("http://{addr}"), KEY, 7);
    assert!(matches!(
        panel.fetch_node_info().await,
        Err(PanelError::Request(_))
    ));
}

#[tokio::test]
async fn traffic_report_ack_and_nack() {
    let (addr, mock) = spawn_mock().await;
    let panel = HttpPanel::new(format!("http://{addr}"), KEY, 7);
    let node = panel.fetch_node_info().await.unwrap();
    let users = panel.fetch_declared_users(&node).await.unwrap();
    let a = users.get("email:a@example.com").unwrap();

    let delta = TrafficDelta {
        upload: 20,
        download: 10,
    };
    assert!(panel.report_traffic(a, delta).await.unwrap());

    mock.refuse_traffic.store(true, Ordering::SeqCst);
    assert!(!panel.report_traffic(a, delta).await.unwrap());

    let posts = mock.posts("/mod_mu/users/traffic");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0], json!({"data": [{"user_id": 1, "u": 20, "d": 10}]}));
}

#[tokio::test]
async fn online_load_and_quality_reports() {
    let (addr, mock) = spawn_mock().await;
    let panel = HttpPanel::new(format!("http://{addr}"), KEY, 7);

    assert!(panel.report_online_count(4).await.unwrap());
    assert_eq!(mock.posts("/mod_mu/nodes/7/online"), [json!({"count": 4})]);

    let load = HostLoad {
        uptime_secs: 3600,
        load: [0.1, 0.2, 0.3],
    };
    assert!(panel.report_load(&load).await.unwrap());
    assert_eq!(
        mock.posts("/mod_mu/nodes/7/info"),
        [json!({"uptime": 3600, "load": "0.10 0.20 0.30"})]
    );

    let report = QualityReport {
        samples: vec![QualitySample {
            name: "cdn".into(),
            ping_ms: Some(12),
            download_mbps: Some(94.5),
            upload_mbps: None,
        }],
    };
    assert!(panel.report_quality(&report).await.unwrap());
    let posted = mock.posts("/mod_mu/func/speedtest");
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0]["data"][0]["name"], "cdn");
    assert_eq!(posted[0]["data"][0]["ping_ms"], 12);
}
