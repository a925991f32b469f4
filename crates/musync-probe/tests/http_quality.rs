//! HttpQualityProbe against an in-process endpoint.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::routing::{get, post};
use musync_probe::{HttpQualityProbe, ProbeError, QualityProbe, QualityTarget};

async fn spawn_endpoint() -> SocketAddr {
    let app = Router::new()
        .route("/blob", get(|| async { vec![7u8; 256 * 1024] }))
        .route("/upload", post(|body: Bytes| async move { body.len().to_string() }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn measures_download_and_upload() {
    let addr = spawn_endpoint().await;
    let probe = HttpQualityProbe::new(
        vec![QualityTarget {
            name: "local".into(),
            download_url: format!("http://{addr}/blob"),
            upload_url: Some(format!("http://{addr}/upload")),
        }],
        Duration::from_secs(10),
        64 * 1024,
    );

    let report = probe.measure().await.unwrap();
    assert_eq!(report.samples.len(), 1);
    let sample = &report.samples[0];
    assert_eq!(sample.name, "local");
    assert!(sample.ping_ms.is_some());
    assert!(sample.download_mbps.unwrap() > 0.0);
    assert!(sample.upload_mbps.unwrap() > 0.0);
}

#[tokio::test]
async fn one_failing_target_does_not_fail_the_report() {
    let addr = spawn_endpoint().await;
    let probe = HttpQualityProbe::new(
        vec![
            QualityTarget {
                name: "missing".into(),
                download_url: format!("http://{addr}/missing"),
                upload_url: None,
            },
            QualityTarget {
                name: "ok".into(),
                download_url: format!("http://{addr}/blob"),
                upload_url: None,
            },
        ],
        Duration::from_secs(10),
        1024,
    );

    let report = probe.measure().await.unwrap();
    assert_eq!(report.samples[0].download_mbps, None);
    assert_eq!(report.samples[0].ping_ms, None);
    assert!(report.samples[1].download_mbps.is_some());
    assert_eq!(report.samples[1].upload_mbps, None);
}

#[tokio::test]
async fn all_targets_failing_is_an_error() {
    let addr = spawn_endpoint().await;
    let probe = HttpQualityProbe::new(
        vec![QualityTarget {
            name: "missing".into(),
            download_url: format!("http://{addr}/missing"),
            upload_url: None,
        }],
        Duration::from_secs(10),
        1024,
    );
    assert!(matches!(
        probe.measure().await,
        Err(ProbeError::AllTargetsFailed)
    ));
}
