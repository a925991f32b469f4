//! User-set reconciliation.
//!
//! [`plan`] diffs the panel's declared users against the proxy's active
//! set. [`ReconciliationEngine`] runs a full pass: fetch, diff, apply one
//! identity at a time, then rewrite and restart the proxy when dirty.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use musync_core::{NodeInfo, TASK_RECONCILE, UserId, UserRecord, UserSet};
use musync_panel::PanelClient;
use musync_proxy::ProxyController;
use tracing::{debug, info, warn};

use crate::error::{SyncError, bounded};
use crate::scheduler::PeriodicTask;

// ── Plan ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Remove,
    Add,
    /// Credential or port rotation: remove, then add.
    Replace,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::Add => "add",
            Self::Replace => "replace",
        }
    }
}

/// A single proxy call a plan expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Remove(UserId),
    Add(UserRecord),
}

/// What a reconciliation pass has to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Active users that are gone or unavailable on the panel.
    pub to_remove: Vec<UserId>,
    /// Declared records whose credential or port differs from the active one.
    pub to_replace: Vec<UserRecord>,
    /// Available declared users the proxy does not have.
    pub to_add: Vec<UserRecord>,
}

impl ReconcilePlan {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_replace.is_empty() && self.to_add.is_empty()
    }

    /// Number of identities touched.
    #[inline]
    pub fn len(&self) -> usize {
        self.to_remove.len() + self.to_replace.len() + self.to_add.len()
    }

    /// Proxy calls in execution order: removals, replacements (remove
    /// then add per identity), additions.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.len() + self.to_replace.len());
        actions.extend(self.to_remove.iter().cloned().map(Action::Remove));
        for user in &self.to_replace {
            actions.push(Action::Remove(user.id.clone()));
            actions.push(Action::Add(user.clone()));
        }
        actions.extend(self.to_add.iter().cloned().map(Action::Add));
        actions
    }
}

/// Diff the declared `remote` set against the proxy's `active` set.
pub fn plan(remote: &UserSet, active: &UserSet) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for current in active {
        match remote.get(current.id.as_str()) {
            Some(declared) if declared.available => {
                if !declared.credential_eq(current) {
                    plan.to_replace.push(declared.clone());
                }
            }
            _ => plan.to_remove.push(current.id.clone()),
        }
    }

    for declared in remote {
        if declared.available && !active.contains(declared.id.as_str()) {
            plan.to_add.push(declared.clone());
        }
    }

    plan
}

// ── Pass report ───────────────────────────────────────────────────

/// Result of one proxy call for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The proxy answered `false`.
    Rejected,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAction {
    pub id: UserId,
    pub kind: ActionKind,
    pub outcome: ApplyOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Nothing changed since the last successful reload.
    NotNeeded,
    Reloaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// `Some` when the node configuration changed this pass.
    pub node: Option<ApplyOutcome>,
    pub plan: ReconcilePlan,
    /// One entry per identity in the plan, in execution order.
    pub applied: Vec<AppliedAction>,
    pub reload: ReloadOutcome,
}

impl ReconcileReport {
    /// Identities whose action did not take effect.
    pub fn failures(&self) -> usize {
        self.applied
            .iter()
            .filter(|a| a.outcome != ApplyOutcome::Applied)
            .count()
    }

    fn count_applied(&self, kind: ActionKind) -> usize {
        self.applied
            .iter()
            .filter(|a| a.kind == kind && a.outcome == ApplyOutcome::Applied)
            .count()
    }
}

// ── Engine ────────────────────────────────────────────────────────

/// Whether the proxy has been written and restarted at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    NeverSynced,
    Synced,
}

/// Owns the dirty flag and sync state; runs reconciliation passes.
pub struct ReconciliationEngine {
    panel: Arc<dyn PanelClient>,
    proxy: Arc<dyn ProxyController>,
    io_timeout: Duration,
    state: SyncState,
    dirty: bool,
    node: Option<NodeInfo>,
}

impl ReconciliationEngine {
    pub fn new(
        panel: Arc<dyn PanelClient>,
        proxy: Arc<dyn ProxyController>,
        io_timeout: Duration,
    ) -> Self {
        Self {
            panel,
            proxy,
            io_timeout,
            state: SyncState::NeverSynced,
            dirty: false,
            node: None,
        }
    }

    #[inline]
    pub fn state(&self) -> SyncState {
        self.state
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Run one full reconciliation pass.
    ///
    /// Fails without touching the proxy when the panel or the active-set
    /// read fails. Per-identity and reload failures are reported in the
    /// returned [`ReconcileReport`] instead.
    pub async fn reconcile(&mut self) -> Result<ReconcileReport, SyncError> {
        let t = self.io_timeout;
        let node = bounded("fetch_node_info", t, self.panel.fetch_node_info()).await?;
        let remote = bounded(
            "fetch_declared_users",
            t,
            self.panel.fetch_declared_users(&node),
        )
        .await?;
        let active = bounded("list_active_users", t, self.proxy.list_active_users()).await?;

        let node_outcome = if self.node.as_ref() != Some(&node) {
            Some(self.apply_node(node).await)
        } else {
            None
        };

        let plan = plan(&remote, &active);
        debug!(
            declared = remote.len(),
            active = active.len(),
            remove = plan.to_remove.len(),
            replace = plan.to_replace.len(),
            add = plan.to_add.len(),
            "reconcile plan"
        );

        let (applied, changed) = self.apply(&plan).await;
        if changed {
            self.dirty = true;
        }

        let reload = if self.dirty || self.state == SyncState::NeverSynced {
            self.reload().await
        } else {
            ReloadOutcome::NotNeeded
        };

        let report = ReconcileReport {
            node: node_outcome,
            plan,
            applied,
            reload,
        };
        let live = (active.len() + report.count_applied(ActionKind::Add))
            .saturating_sub(report.count_applied(ActionKind::Remove));
        musync_metrics::set_active_users(live);

        Ok(report)
    }

    async fn apply_node(&mut self, node: NodeInfo) -> ApplyOutcome {
        let applied = bounded(
            "apply_node_info",
            self.io_timeout,
            self.proxy.apply_node_info(&node),
        )
        .await;
        match applied {
            Ok(()) => {
                info!(
                    node_id = node.node_id,
                    name = %node.name,
                    traffic_rate = node.traffic_rate,
                    "node configuration changed"
                );
                self.node = Some(node);
                self.dirty = true;
                ApplyOutcome::Applied
            }
            Err(e) => {
                warn!(
                    node_id = node.node_id,
                    error = %e,
                    "failed to apply node configuration"
                );
                ApplyOutcome::Failed(e.to_string())
            }
        }
    }

    /// Apply `plan` one identity at a time. The flag is set when at least
    /// one call actually changed the proxy's user set.
    async fn apply(&self, plan: &ReconcilePlan) -> (Vec<AppliedAction>, bool) {
        let mut applied = Vec::with_capacity(plan.len());
        let mut changed = false;

        for id in &plan.to_remove {
            let outcome = self.remove(id).await;
            changed |= outcome == ApplyOutcome::Applied;
            applied.push(finish(id, ActionKind::Remove, outcome));
        }

        for user in &plan.to_replace {
            // The stale entry must be gone before the new one may claim it.
            let outcome = match self.remove(&user.id).await {
                ApplyOutcome::Applied => {
                    changed = true;
                    self.add(user).await
                }
                other => other,
            };
            applied.push(finish(&user.id, ActionKind::Replace, outcome));
        }

        for user in &plan.to_add {
            let outcome = self.add(user).await;
            changed |= outcome == ApplyOutcome::Applied;
            applied.push(finish(&user.id, ActionKind::Add, outcome));
        }

        (applied, changed)
    }

    async fn remove(&self, id: &UserId) -> ApplyOutcome {
        outcome(bounded("remove_user", self.io_timeout, self.proxy.remove_user(id)).await)
    }

    async fn add(&self, user: &UserRecord) -> ApplyOutcome {
        outcome(bounded("add_user", self.io_timeout, self.proxy.add_user(user)).await)
    }

    async fn reload(&mut self) -> ReloadOutcome {
        match self.write_and_restart().await {
            Ok(()) => {
                if self.state == SyncState::NeverSynced {
                    info!("initial proxy sync complete");
                }
                self.dirty = false;
                self.state = SyncState::Synced;
                musync_metrics::record_proxy_reload(true);
                ReloadOutcome::Reloaded
            }
            Err(e) => {
                warn!(error = %e, "proxy reload failed, will retry next pass");
                musync_metrics::record_proxy_reload(false);
                ReloadOutcome::Failed(e.to_string())
            }
        }
    }

    async fn write_and_restart(&self) -> Result<(), SyncError> {
        bounded("write_config", self.io_timeout, self.proxy.write_config()).await?;
        bounded("restart", self.io_timeout, self.proxy.restart()).await
    }
}

fn outcome<E: std::fmt::Display>(result: Result<bool, E>) -> ApplyOutcome {
    match result {
        Ok(true) => ApplyOutcome::Applied,
        Ok(false) => ApplyOutcome::Rejected,
        Err(e) => ApplyOutcome::Failed(e.to_string()),
    }
}

fn finish(id: &UserId, kind: ActionKind, outcome: ApplyOutcome) -> AppliedAction {
    musync_metrics::record_reconcile_action(kind.as_str());
    match &outcome {
        ApplyOutcome::Applied => debug!(user = %id, action = kind.as_str(), "applied"),
        ApplyOutcome::Rejected => {
            musync_metrics::record_apply_failure(kind.as_str());
            warn!(user = %id, action = kind.as_str(), "proxy rejected action");
        }
        ApplyOutcome::Failed(e) => {
            musync_metrics::record_apply_failure(kind.as_str());
            warn!(user = %id, action = kind.as_str(), error = %e, "action failed");
        }
    }
    AppliedAction {
        id: id.clone(),
        kind,
        outcome,
    }
}

#[async_trait]
impl PeriodicTask for ReconciliationEngine {
    fn name(&self) -> &'static str {
        TASK_RECONCILE
    }

    async fn run_once(&mut self) -> Result<(), SyncError> {
        let report = self.reconcile().await?;
        if report.plan.is_empty()
            && report.node.is_none()
            && report.reload == ReloadOutcome::NotNeeded
        {
            debug!("proxy in sync");
        } else {
            info!(
                removed = report.count_applied(ActionKind::Remove),
                replaced = report.count_applied(ActionKind::Replace),
                added = report.count_applied(ActionKind::Add),
                failed = report.failures(),
                reload = ?report.reload,
                "reconcile pass complete"
            );
        }
        Ok(())
    }
}
