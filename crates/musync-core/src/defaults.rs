//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Task Interval Defaults
// ============================================================================

/// Default period between user-set reconciliations, in seconds.
pub const DEFAULT_RECONCILE_SECS: u64 = 60;
/// Default period between traffic accounting passes, in seconds.
pub const DEFAULT_TRAFFIC_SECS: u64 = 360;
/// Default period between host load reports, in seconds.
pub const DEFAULT_LOAD_SECS: u64 = 60;
/// Default period between bandwidth-quality measurements, in seconds (6h).
pub const DEFAULT_QUALITY_SECS: u64 = 21_600;
/// Longest accepted task period, in seconds (30 days).
pub const MAX_INTERVAL_SECS: u64 = 30 * 24 * 3600;

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Default timeout applied to every panel/proxy call, in seconds.
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 15;
/// Default timeout for a single quality-probe target, in seconds.
pub const DEFAULT_QUALITY_TARGET_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Panel Defaults
// ============================================================================

/// Default user field used to build a stable user identity.
pub const DEFAULT_IDENTITY_FIELD: &str = "email";

// ============================================================================
// Proxy Defaults
// ============================================================================

/// Default path of the user list written for the local proxy.
pub const DEFAULT_PROXY_CONFIG_PATH: &str = "/etc/musync/users.json";
/// Default cipher method when the panel leaves it empty.
pub const DEFAULT_METHOD: &str = "aes-256-gcm";

// ============================================================================
// Quality Probe Defaults
// ============================================================================

/// Default upload payload size for quality probes (1 MiB).
pub const DEFAULT_QUALITY_UPLOAD_BYTES: usize = 1024 * 1024;

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
