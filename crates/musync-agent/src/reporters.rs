//! Host load and bandwidth-quality reporters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use musync_core::{TASK_LOAD, TASK_QUALITY};
use musync_panel::PanelClient;
use musync_probe::{LoadProbe, QualityProbe};
use tracing::{debug, info, warn};

use crate::error::{SyncError, bounded};
use crate::scheduler::PeriodicTask;

/// Samples host load and reports it to the panel.
pub struct LoadReporter {
    probe: Arc<dyn LoadProbe>,
    panel: Arc<dyn PanelClient>,
    io_timeout: Duration,
}

impl LoadReporter {
    pub fn new(
        probe: Arc<dyn LoadProbe>,
        panel: Arc<dyn PanelClient>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            probe,
            panel,
            io_timeout,
        }
    }
}

#[async_trait]
impl PeriodicTask for LoadReporter {
    fn name(&self) -> &'static str {
        TASK_LOAD
    }

    async fn run_once(&mut self) -> Result<(), SyncError> {
        let load = self.probe.sample()?;
        let acked = bounded(
            "report_load",
            self.io_timeout,
            self.panel.report_load(&load),
        )
        .await?;
        musync_metrics::record_panel_report(TASK_LOAD, acked);
        if acked {
            debug!(uptime_secs = load.uptime_secs, load = %load.load_string(), "load reported");
        } else {
            warn!("panel did not acknowledge load report");
        }
        Ok(())
    }
}

/// Runs a bandwidth-quality measurement and reports it to the panel.
pub struct QualityReporter {
    probe: Arc<dyn QualityProbe>,
    panel: Arc<dyn PanelClient>,
    io_timeout: Duration,
}

impl QualityReporter {
    pub fn new(
        probe: Arc<dyn QualityProbe>,
        panel: Arc<dyn PanelClient>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            probe,
            panel,
            io_timeout,
        }
    }
}

#[async_trait]
impl PeriodicTask for QualityReporter {
    fn name(&self) -> &'static str {
        TASK_QUALITY
    }

    async fn run_once(&mut self) -> Result<(), SyncError> {
        let report = self.probe.measure().await?;
        if report.samples.is_empty() {
            debug!("no quality targets configured");
            return Ok(());
        }

        let acked = bounded(
            "report_quality",
            self.io_timeout,
            self.panel.report_quality(&report),
        )
        .await?;
        musync_metrics::record_panel_report(TASK_QUALITY, acked);
        if acked {
            info!(targets = report.samples.len(), "quality result reported");
        } else {
            warn!("panel did not acknowledge quality result");
        }
        Ok(())
    }
}
