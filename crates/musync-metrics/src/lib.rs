//! Metrics collection and Prometheus exporter for musync.
//!
//! Covers reconciliation actions, proxy reloads, traffic accounting and
//! task health. Recording is a no-op until a recorder is installed, so
//! tests and runs without `[metrics].listen` pay nothing.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize Prometheus metrics exporter.
///
/// Starts an HTTP server on the given address to expose metrics.
/// Returns an error message if binding fails.
pub fn init_prometheus(listen: &str) -> Result<(), String> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| format!("invalid metrics listen address: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install prometheus exporter: {}", e))?;

    Ok(())
}

// ============================================================================
// Metric Names
// ============================================================================

/// Reconciliation actions issued, by kind (add, remove, replace).
pub const RECONCILE_ACTIONS_TOTAL: &str = "musync_reconcile_actions_total";
/// Reconciliation actions the proxy rejected or failed, by kind.
pub const RECONCILE_APPLY_FAILURES_TOTAL: &str = "musync_reconcile_apply_failures_total";
/// Proxy config write + restart cycles, by result (ok, error).
pub const PROXY_RELOADS_TOTAL: &str = "musync_proxy_reloads_total";
/// Users currently configured on the local proxy.
pub const ACTIVE_USERS: &str = "musync_active_users";
/// Bytes acknowledged by the panel, by direction (upload, download).
pub const TRAFFIC_REPORTED_BYTES_TOTAL: &str = "musync_traffic_reported_bytes_total";
/// Counter resets absorbed by the accountant.
pub const TRAFFIC_ANOMALIES_TOTAL: &str = "musync_traffic_anomalies_total";
/// Traffic deltas the panel did not acknowledge (retried next pass).
pub const TRAFFIC_UNACKED_TOTAL: &str = "musync_traffic_unacked_total";
/// Users online in the last accounting pass.
pub const ONLINE_USERS: &str = "musync_online_users";
/// Reports sent to the panel, by kind and result.
pub const PANEL_REPORTS_TOTAL: &str = "musync_panel_reports_total";
/// Task pass duration histogram (seconds), by task.
pub const TASK_DURATION_SECONDS: &str = "musync_task_duration_seconds";
/// Failed task passes, by task and failure kind.
pub const TASK_FAILURES_TOTAL: &str = "musync_task_failures_total";

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a reconciliation action (kind: "add", "remove", "replace").
#[inline]
pub fn record_reconcile_action(kind: &'static str) {
    counter!(RECONCILE_ACTIONS_TOTAL, "kind" => kind).increment(1);
}

/// Record a reconciliation action that did not take effect.
#[inline]
pub fn record_apply_failure(kind: &'static str) {
    counter!(RECONCILE_APPLY_FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Record a proxy write + restart cycle.
#[inline]
pub fn record_proxy_reload(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!(PROXY_RELOADS_TOTAL, "result" => result).increment(1);
}

/// Set the active user gauge.
#[inline]
pub fn set_active_users(count: usize) {
    gauge!(ACTIVE_USERS).set(count as f64);
}

/// Record traffic acknowledged by the panel.
#[inline]
pub fn record_traffic_reported(upload: u64, download: u64) {
    counter!(TRAFFIC_REPORTED_BYTES_TOTAL, "direction" => "upload").increment(upload);
    counter!(TRAFFIC_REPORTED_BYTES_TOTAL, "direction" => "download").increment(download);
}

/// Record an absorbed counter reset.
#[inline]
pub fn record_traffic_anomaly() {
    counter!(TRAFFIC_ANOMALIES_TOTAL).increment(1);
}

/// Record a delta the panel did not acknowledge.
#[inline]
pub fn record_traffic_unacked() {
    counter!(TRAFFIC_UNACKED_TOTAL).increment(1);
}

/// Set the online user gauge.
#[inline]
pub fn set_online_users(count: usize) {
    gauge!(ONLINE_USERS).set(count as f64);
}

/// Record a panel report (kind: "traffic", "online", "load", "quality").
#[inline]
pub fn record_panel_report(kind: &'static str, acked: bool) {
    let result = if acked { "ack" } else { "nack" };
    counter!(PANEL_REPORTS_TOTAL, "kind" => kind, "result" => result).increment(1);
}

/// Record how long one task pass took.
#[inline]
pub fn record_task_duration(task: &'static str, duration_secs: f64) {
    histogram!(TASK_DURATION_SECONDS, "task" => task).record(duration_secs);
}

/// Record a failed task pass.
#[inline]
pub fn record_task_failure(task: &'static str, kind: &'static str) {
    counter!(TASK_FAILURES_TOTAL, "task" => task, "kind" => kind).increment(1);
}

// ============================================================================
// Label Constants (re-exported from musync-core)
// ============================================================================

pub use musync_core::{
    FAILURE_PANEL, FAILURE_PROBE, FAILURE_PROXY, FAILURE_TIMEOUT, TASK_LOAD, TASK_QUALITY,
    TASK_RECONCILE, TASK_TRAFFIC,
};
