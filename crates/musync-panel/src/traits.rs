//! Panel client trait.

use std::sync::Arc;

use async_trait::async_trait;
use musync_core::{HostLoad, NodeInfo, QualityReport, TrafficDelta, UserRecord, UserSet};

use crate::error::PanelError;

/// Access to the remote control plane.
///
/// Report methods return `Ok(true)` only when the panel acknowledged the
/// report; `Ok(false)` means it answered but did not accept it.
#[async_trait]
pub trait PanelClient: Send + Sync {
    /// Fetch this node's declared configuration.
    async fn fetch_node_info(&self) -> Result<NodeInfo, PanelError>;

    /// Fetch the full declared user set for `node`.
    async fn fetch_declared_users(&self, node: &NodeInfo) -> Result<UserSet, PanelError>;

    /// Report traffic accrued by `user` since its last acknowledged report.
    async fn report_traffic(&self, user: &UserRecord, delta: TrafficDelta)
    -> Result<bool, PanelError>;

    /// Report how many users moved traffic in the last accounting pass.
    async fn report_online_count(&self, count: usize) -> Result<bool, PanelError>;

    /// Report host uptime and load averages.
    async fn report_load(&self, load: &HostLoad) -> Result<bool, PanelError>;

    /// Report a bandwidth-quality measurement.
    async fn report_quality(&self, report: &QualityReport) -> Result<bool, PanelError>;
}

/// Blanket implementation for `Arc<P>` where `P: PanelClient`.
#[async_trait]
impl<P: PanelClient + ?Sized> PanelClient for Arc<P> {
    #[inline]
    async fn fetch_node_info(&self) -> Result<NodeInfo, PanelError> {
        (**self).fetch_node_info().await
    }

    #[inline]
    async fn fetch_declared_users(&self, node: &NodeInfo) -> Result<UserSet, PanelError> {
        (**self).fetch_declared_users(node).await
    }

    #[inline]
    async fn report_traffic(
        &self,
        user: &UserRecord,
        delta: TrafficDelta,
    ) -> Result<bool, PanelError> {
        (**self).report_traffic(user, delta).await
    }

    #[inline]
    async fn report_online_count(&self, count: usize) -> Result<bool, PanelError> {
        (**self).report_online_count(count).await
    }

    #[inline]
    async fn report_load(&self, load: &HostLoad) -> Result<bool, PanelError> {
        (**self).report_load(load).await
    }

    #[inline]
    async fn report_quality(&self, report: &QualityReport) -> Result<bool, PanelError> {
        (**self).report_quality(report).await
    }
}
