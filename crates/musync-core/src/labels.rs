//! Task and failure labels for metrics and logging.
//!
//! These constants keep label values consistent across crates.

/// Reconciliation task.
pub const TASK_RECONCILE: &str = "reconcile";
/// Traffic accounting task.
pub const TASK_TRAFFIC: &str = "traffic";
/// Host load report task.
pub const TASK_LOAD: &str = "load";
/// Bandwidth-quality report task.
pub const TASK_QUALITY: &str = "quality";

/// Remote panel call failed.
pub const FAILURE_PANEL: &str = "panel";
/// Local proxy control call failed.
pub const FAILURE_PROXY: &str = "proxy";
/// Local probe failed.
pub const FAILURE_PROBE: &str = "probe";
/// A call exceeded its deadline.
pub const FAILURE_TIMEOUT: &str = "timeout";
