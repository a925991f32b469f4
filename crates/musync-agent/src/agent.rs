//! Process-scoped agent context.

use std::sync::Arc;
use std::time::Duration;

use musync_config::AgentConfig;
use musync_panel::PanelClient;
use musync_probe::{LoadProbe, QualityProbe};
use musync_proxy::ProxyController;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::accountant::TrafficAccountant;
use crate::reconcile::ReconciliationEngine;
use crate::reporters::{LoadReporter, QualityReporter};
use crate::scheduler::{run_pass, spawn_periodic};

/// Handles to everything the agent talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub panel: Arc<dyn PanelClient>,
    pub proxy: Arc<dyn ProxyController>,
    pub load: Arc<dyn LoadProbe>,
    pub quality: Arc<dyn QualityProbe>,
}

/// Task periods (`None` = disabled) and the per-call deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub reconcile: Option<Duration>,
    pub traffic: Option<Duration>,
    pub load: Option<Duration>,
    pub quality: Option<Duration>,
    pub io_timeout: Duration,
}

impl Schedule {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            reconcile: config.intervals.reconcile(),
            traffic: config.intervals.traffic(),
            load: config.intervals.load(),
            quality: config.intervals.quality(),
            io_timeout: config.timeouts.io(),
        }
    }
}

/// The running agent.
///
/// [`run`](Self::run) reconciles once, then drives the periodic tasks
/// until the shutdown token is cancelled and every task has stopped.
pub struct Agent {
    collaborators: Collaborators,
    schedule: Schedule,
}

impl Agent {
    pub fn new(collaborators: Collaborators, schedule: Schedule) -> Self {
        Self {
            collaborators,
            schedule,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let Collaborators {
            panel,
            proxy,
            load,
            quality,
        } = self.collaborators;
        let schedule = self.schedule;
        let io = schedule.io_timeout;

        let mut engine = ReconciliationEngine::new(panel.clone(), proxy.clone(), io);
        info!("running initial reconciliation");
        if run_pass(&mut engine).await.is_err() {
            warn!("initial reconciliation failed, the proxy will be synced on a later pass");
        }
        if shutdown.is_cancelled() {
            info!("shutdown requested during startup");
            return;
        }

        let mut handles = Vec::with_capacity(4);
        if let Some(period) = schedule.reconcile {
            handles.push(spawn_periodic(engine, period, shutdown.clone()));
        }
        if let Some(period) = schedule.traffic {
            let accountant = TrafficAccountant::new(panel.clone(), proxy, io);
            handles.push(spawn_periodic(accountant, period, shutdown.clone()));
        }
        if let Some(period) = schedule.load {
            let reporter = LoadReporter::new(load, panel.clone(), io);
            handles.push(spawn_periodic(reporter, period, shutdown.clone()));
        }
        if let Some(period) = schedule.quality {
            let reporter = QualityReporter::new(quality, panel, io);
            handles.push(spawn_periodic(reporter, period, shutdown.clone()));
        }
        info!(tasks = handles.len(), "agent running");

        shutdown.cancelled().await;
        info!("shutdown requested, waiting for running passes");
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "task panicked");
            }
        }
        info!("agent stopped");
    }
}
