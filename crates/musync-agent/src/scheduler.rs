//! Periodic task driver.
//!
//! Every task runs in its own tokio task and owns its state, so a task is
//! never re-entered: a tick that arrives while a pass is still running is
//! skipped rather than queued.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SyncError;

/// A unit of periodic work.
#[async_trait]
pub trait PeriodicTask: Send + 'static {
    /// Task label for logs and metrics.
    fn name(&self) -> &'static str;

    /// Run one pass. Errors are logged by the scheduler; the task keeps
    /// its schedule.
    async fn run_once(&mut self) -> Result<(), SyncError>;
}

/// Run one pass with timing, logging and metrics.
pub async fn run_pass<T: PeriodicTask + ?Sized>(task: &mut T) -> Result<(), SyncError> {
    let name = task.name();
    let start = Instant::now();
    let result = task.run_once().await;
    musync_metrics::record_task_duration(name, start.elapsed().as_secs_f64());

    if let Err(e) = &result {
        musync_metrics::record_task_failure(name, e.kind());
        if e.is_transient() {
            warn!(task = name, error = %e, "pass skipped, retrying next tick");
        } else {
            warn!(task = name, error = %e, "pass failed");
        }
    }
    result
}

/// Spawn `task` to run every `period` until `shutdown` is cancelled.
///
/// The first pass runs one full period after spawning. A pass in progress
/// when shutdown is requested is allowed to finish.
pub fn spawn_periodic<T: PeriodicTask>(
    mut task: T,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = task.name();
        let Some(start) = tokio::time::Instant::now().checked_add(period) else {
            warn!(
                task = name,
                period_secs = period.as_secs(),
                "period out of range, task will not run"
            );
            shutdown.cancelled().await;
            return;
        };
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(task = name, period_secs = period.as_secs(), "task scheduled");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!(task = name, "task shutting down");
                    return;
                }

                _ = ticker.tick() => {
                    let _ = run_pass(&mut task).await;
                }
            }
        }
    })
}
