//! Agent error types.

use std::time::Duration;

use musync_core::{FAILURE_PANEL, FAILURE_PROBE, FAILURE_PROXY, FAILURE_TIMEOUT};
use musync_panel::PanelError;
use musync_probe::ProbeError;
use musync_proxy::ProxyError;

/// A collaborator call failed during a task pass.
///
/// None of these stop the agent; the pass that hit one is abandoned (or,
/// for per-user work, that user is skipped) and the next tick retries.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("panel: {0}")]
    Panel(#[from] PanelError),

    #[error("proxy: {0}")]
    Proxy(#[from] ProxyError),

    #[error("probe: {0}")]
    Probe(#[from] ProbeError),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

impl SyncError {
    /// Remote-side failure: nothing local was mutated, retry next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Panel(_) | Self::Timeout { .. })
    }

    /// Failure label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Panel(_) => FAILURE_PANEL,
            Self::Proxy(_) => FAILURE_PROXY,
            Self::Probe(_) => FAILURE_PROBE,
            Self::Timeout { .. } => FAILURE_TIMEOUT,
        }
    }
}

/// Run one collaborator call under a deadline.
pub(crate) async fn bounded<T, E, F>(
    op: &'static str,
    after: Duration,
    fut: F,
) -> Result<T, SyncError>
where
    F: Future<Output = Result<T, E>>,
    SyncError: From<E>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(SyncError::from),
        Err(_) => Err(SyncError::Timeout { op, after }),
    }
}
