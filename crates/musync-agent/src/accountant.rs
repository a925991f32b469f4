//! Per-user traffic accounting.
//!
//! Live counters are cumulative and may reset when the proxy restarts.
//! Deltas are always recomputed from the ledger baseline, so a report that
//! fails is simply re-derived (identically, or larger) on the next pass and
//! nothing is ever counted twice.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use musync_core::{Counters, TASK_TRAFFIC, TrafficDelta, UserId, UserRecord, UserSet};
use musync_panel::PanelClient;
use musync_proxy::ProxyController;
use tracing::{debug, info, warn};

use crate::error::{SyncError, bounded};
use crate::ledger::TrafficLedger;
use crate::scheduler::PeriodicTask;

/// How one user's counters were handled in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficOutcome {
    /// No baseline yet; the reading became the baseline.
    FirstSeen(Counters),
    /// No movement since the baseline.
    Idle,
    /// Counters went backwards; the baseline was reset to the reading.
    Anomaly { baseline: Counters, current: Counters },
    /// Delta acknowledged; the baseline advanced.
    Reported(TrafficDelta),
    /// The panel answered without acknowledging.
    Unacknowledged(TrafficDelta),
    ReportFailed { delta: TrafficDelta, error: String },
    CountersUnavailable(String),
}

impl TrafficOutcome {
    /// Counter movement (either way) means the user was online.
    pub fn is_online(&self) -> bool {
        matches!(
            self,
            Self::Anomaly { .. }
                | Self::Reported(_)
                | Self::Unacknowledged(_)
                | Self::ReportFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountReport {
    /// One entry per active user.
    pub outcomes: Vec<(UserId, TrafficOutcome)>,
    pub online: usize,
    /// Panel answer to the online count; `None` if the report failed.
    pub online_acked: Option<bool>,
}

impl AccountReport {
    pub fn outcome(&self, id: &str) -> Option<&TrafficOutcome> {
        self.outcomes
            .iter()
            .find(|(uid, _)| uid.as_str() == id)
            .map(|(_, outcome)| outcome)
    }
}

/// Owns the traffic ledger; runs accounting passes.
pub struct TrafficAccountant {
    panel: Arc<dyn PanelClient>,
    proxy: Arc<dyn ProxyController>,
    io_timeout: Duration,
    ledger: TrafficLedger,
}

impl TrafficAccountant {
    pub fn new(
        panel: Arc<dyn PanelClient>,
        proxy: Arc<dyn ProxyController>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            panel,
            proxy,
            io_timeout,
            ledger: TrafficLedger::new(),
        }
    }

    #[inline]
    pub fn ledger(&self) -> &TrafficLedger {
        &self.ledger
    }

    /// Run one accounting pass over the proxy's active users.
    ///
    /// Only a failed active-set read fails the pass. Per-user failures are
    /// recorded in the report and the online count is sent regardless.
    pub async fn account(&mut self) -> Result<AccountReport, SyncError> {
        let active = bounded(
            "list_active_users",
            self.io_timeout,
            self.proxy.list_active_users(),
        )
        .await?;

        let pruned = self.ledger.retain_active(&active);
        if pruned > 0 {
            debug!(pruned, "dropped baselines of departed users");
        }

        let readings = self.read_counters(&active).await;

        let mut outcomes = Vec::with_capacity(active.len());
        let mut online = 0;
        for (user, reading) in active.iter().zip(readings) {
            let outcome = self.account_user(user, reading).await;
            if outcome.is_online() {
                online += 1;
            }
            outcomes.push((user.id.clone(), outcome));
        }

        musync_metrics::set_online_users(online);
        let online_acked = match bounded(
            "report_online_count",
            self.io_timeout,
            self.panel.report_online_count(online),
        )
        .await
        {
            Ok(acked) => {
                musync_metrics::record_panel_report("online", acked);
                if !acked {
                    warn!(online, "panel did not acknowledge online count");
                }
                Some(acked)
            }
            Err(e) => {
                warn!(online, error = %e, "failed to report online count");
                None
            }
        };

        Ok(AccountReport {
            outcomes,
            online,
            online_acked,
        })
    }

    /// One reading per active user, in iteration order. A failed batch
    /// read marks every user unavailable.
    async fn read_counters(&self, active: &UserSet) -> Vec<Result<Counters, String>> {
        let ids: Vec<UserId> = active.iter().map(|u| u.id.clone()).collect();
        match bounded(
            "read_counters",
            self.io_timeout,
            self.proxy.read_counters(&ids),
        )
        .await
        {
            Ok(readings) if readings.len() == ids.len() => readings
                .into_iter()
                .map(|r| r.map_err(|e| e.to_string()))
                .collect(),
            Ok(readings) => {
                warn!(
                    expected = ids.len(),
                    got = readings.len(),
                    "counter read returned the wrong number of entries"
                );
                vec![Err("incomplete counter read".to_string()); ids.len()]
            }
            Err(e) => {
                warn!(users = ids.len(), error = %e, "failed to read live counters");
                vec![Err(e.to_string()); ids.len()]
            }
        }
    }

    async fn account_user(
        &mut self,
        user: &UserRecord,
        reading: Result<Counters, String>,
    ) -> TrafficOutcome {
        let current = match reading {
            Ok(counters) => counters,
            Err(e) => {
                warn!(user = %user.id, error = %e, "live counters unavailable");
                return TrafficOutcome::CountersUnavailable(e);
            }
        };

        let Some(baseline) = self.ledger.baseline(&user.id) else {
            debug!(user = %user.id, ?current, "baseline established");
            self.ledger.set_baseline(user.id.clone(), current);
            return TrafficOutcome::FirstSeen(current);
        };

        match current.total().cmp(&baseline.total()) {
            Ordering::Equal => TrafficOutcome::Idle,
            Ordering::Less => {
                warn!(
                    user = %user.id,
                    ?baseline,
                    ?current,
                    "traffic counters went backwards, resetting baseline"
                );
                musync_metrics::record_traffic_anomaly();
                self.ledger.set_baseline(user.id.clone(), current);
                TrafficOutcome::Anomaly { baseline, current }
            }
            Ordering::Greater => {
                let delta = current.delta_since(baseline);
                let sent = bounded(
                    "report_traffic",
                    self.io_timeout,
                    self.panel.report_traffic(user, delta),
                )
                .await;
                match sent {
                    Ok(true) => {
                        musync_metrics::record_panel_report(TASK_TRAFFIC, true);
                        musync_metrics::record_traffic_reported(delta.upload, delta.download);
                        self.ledger.set_baseline(user.id.clone(), current);
                        TrafficOutcome::Reported(delta)
                    }
                    Ok(false) => {
                        musync_metrics::record_panel_report(TASK_TRAFFIC, false);
                        musync_metrics::record_traffic_unacked();
                        warn!(user = %user.id, ?delta, "panel did not acknowledge traffic");
                        TrafficOutcome::Unacknowledged(delta)
                    }
                    Err(e) => {
                        musync_metrics::record_traffic_unacked();
                        warn!(user = %user.id, ?delta, error = %e, "failed to report traffic");
                        TrafficOutcome::ReportFailed {
                            delta,
                            error: e.to_string(),
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl PeriodicTask for TrafficAccountant {
    fn name(&self) -> &'static str {
        TASK_TRAFFIC
    }

    async fn run_once(&mut self) -> Result<(), SyncError> {
        let report = self.account().await?;
        let reported = report
            .outcomes
            .iter()
            .filter(|(_, o)| matches!(o, TrafficOutcome::Reported(_)))
            .count();
        info!(
            users = report.outcomes.len(),
            online = report.online,
            reported,
            "traffic pass complete"
        );
        Ok(())
    }
}
