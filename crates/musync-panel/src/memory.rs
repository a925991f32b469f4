//! In-memory panel.

use async_trait::async_trait;
use musync_core::{HostLoad, NodeInfo, QualityReport, TrafficDelta, UserId, UserRecord, UserSet};
use parking_lot::Mutex;

use crate::error::PanelError;
use crate::traits::PanelClient;

/// One report received by [`MemoryPanel`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelReport {
    Traffic { id: UserId, delta: TrafficDelta },
    Online(usize),
    Load(HostLoad),
    Quality(QualityReport),
}

#[derive(Debug)]
struct Inner {
    node: NodeInfo,
    users: UserSet,
    reports: Vec<PanelReport>,
    fetches: usize,
    fail_fetch: bool,
    fail_reports: bool,
    ack: bool,
}

/// Panel that serves a fixed declared state from memory.
///
/// Reports are recorded whenever they reach the panel, acknowledged or
/// not. Failures and negative acknowledgments can be injected.
#[derive(Debug)]
pub struct MemoryPanel {
    inner: Mutex<Inner>,
}

impl MemoryPanel {
    pub fn new(node: NodeInfo) -> Self {
        Self {
            inner: Mutex::new(Inner {
                node,
                users: UserSet::new(),
                reports: Vec::new(),
                fetches: 0,
                fail_fetch: false,
                fail_reports: false,
                ack: true,
            }),
        }
    }

    /// Start with `users` declared.
    pub fn with_users<I: IntoIterator<Item = UserRecord>>(node: NodeInfo, users: I) -> Self {
        let panel = Self::new(node);
        panel.set_users(users);
        panel
    }

    /// Replace the declared users.
    pub fn set_users<I: IntoIterator<Item = UserRecord>>(&self, users: I) {
        self.inner.lock().users = users.into_iter().collect();
    }

    pub fn set_node(&self, node: NodeInfo) {
        self.inner.lock().node = node;
    }

    /// Make node and user fetches fail.
    pub fn fail_fetch(&self, fail: bool) {
        self.inner.lock().fail_fetch = fail;
    }

    /// Make every report fail with an error.
    pub fn fail_reports(&self, fail: bool) {
        self.inner.lock().fail_reports = fail;
    }

    /// Acknowledge reports (`true`, default) or refuse them.
    pub fn ack(&self, ack: bool) {
        self.inner.lock().ack = ack;
    }

    /// Reports received so far.
    pub fn reports(&self) -> Vec<PanelReport> {
        self.inner.lock().reports.clone()
    }

    /// Traffic reports received so far.
    pub fn traffic_reports(&self) -> Vec<(UserId, TrafficDelta)> {
        self.inner
            .lock()
            .reports
            .iter()
            .filter_map(|r| match r {
                PanelReport::Traffic { id, delta } => Some((id.clone(), *delta)),
                _ => None,
            })
            .collect()
    }

    /// Last online count received.
    pub fn last_online(&self) -> Option<usize> {
        self.inner.lock().reports.iter().rev().find_map(|r| match r {
            PanelReport::Online(n) => Some(*n),
            _ => None,
        })
    }

    pub fn clear_reports(&self) {
        self.inner.lock().reports.clear();
    }

    /// Number of successful user fetches.
    pub fn fetches(&self) -> usize {
        self.inner.lock().fetches
    }

    fn record(&self, report: PanelReport) -> Result<bool, PanelError> {
        let mut inner = self.inner.lock();
        if inner.fail_reports {
            return Err(PanelError::Request("injected report failure".into()));
        }
        inner.reports.push(report);
        Ok(inner.ack)
    }
}

#[async_trait]
impl PanelClient for MemoryPanel {
    async fn fetch_node_info(&self) -> Result<NodeInfo, PanelError> {
        let inner = self.inner.lock();
        if inner.fail_fetch {
            return Err(PanelError::Request("injected fetch failure".into()));
        }
        Ok(inner.node.clone())
    }

    async fn fetch_declared_users(&self, _node: &NodeInfo) -> Result<UserSet, PanelError> {
        let mut inner = self.inner.lock();
        if inner.fail_fetch {
            return Err(PanelError::Request("injected fetch failure".into()));
        }
        inner.fetches += 1;
        Ok(inner.users.clone())
    }

    async fn report_traffic(
        &self,
        user: &UserRecord,
        delta: TrafficDelta,
    ) -> Result<bool, PanelError> {
        self.record(PanelReport::Traffic {
            id: user.id.clone(),
            delta,
        })
    }

    async fn report_online_count(&self, count: usize) -> Result<bool, PanelError> {
        self.record(PanelReport::Online(count))
    }

    async fn report_load(&self, load: &HostLoad) -> Result<bool, PanelError> {
        self.record(PanelReport::Load(*load))
    }

    async fn report_quality(&self, report: &QualityReport) -> Result<bool, PanelError> {
        self.record(PanelReport::Quality(report.clone()))
    }
}
