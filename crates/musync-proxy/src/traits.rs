//! Proxy controller trait.

use std::sync::Arc;

use async_trait::async_trait;
use musync_core::{Counters, NodeInfo, UserId, UserRecord, UserSet};

use crate::error::ProxyError;

/// Control over the local proxy's user set and lifecycle.
///
/// Implementations must be thread-safe: the reconcile and traffic tasks
/// call into the same controller concurrently. Each call must observe a
/// consistent snapshot of the controller's state.
#[async_trait]
pub trait ProxyController: Send + Sync {
    /// Snapshot of the users currently configured.
    async fn list_active_users(&self) -> Result<UserSet, ProxyError>;

    /// Add a user. `Ok(false)` means the controller declined (e.g. the
    /// identity or port is already taken).
    async fn add_user(&self, user: &UserRecord) -> Result<bool, ProxyError>;

    /// Remove a user. `Ok(false)` means it was not configured.
    async fn remove_user(&self, id: &UserId) -> Result<bool, ProxyError>;

    /// Cumulative upload/download counters for a user.
    async fn read_live_counters(&self, id: &UserId) -> Result<Counters, ProxyError>;

    /// Counters for every id in `ids`, one entry per id in the same order.
    ///
    /// An outer error means no reading was possible at all; an inner error
    /// affects only that user. The default reads each user in turn.
    async fn read_counters(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<Result<Counters, ProxyError>>, ProxyError> {
        let mut readings = Vec::with_capacity(ids.len());
        for id in ids {
            readings.push(self.read_live_counters(id).await);
        }
        Ok(readings)
    }

    /// Adopt new node-level configuration (takes effect on next write).
    async fn apply_node_info(&self, node: &NodeInfo) -> Result<(), ProxyError>;

    /// Persist the full current configuration.
    async fn write_config(&self) -> Result<(), ProxyError>;

    /// Restart the proxy so it picks up the written configuration.
    async fn restart(&self) -> Result<(), ProxyError>;
}

/// Blanket implementation for `Arc<C>` where `C: ProxyController`.
#[async_trait]
impl<C: ProxyController + ?Sized> ProxyController for Arc<C> {
    #[inline]
    async fn list_active_users(&self) -> Result<UserSet, ProxyError> {
        (**self).list_active_users().await
    }

    #[inline]
    async fn add_user(&self, user: &UserRecord) -> Result<bool, ProxyError> {
        (**self).add_user(user).await
    }

    #[inline]
    async fn remove_user(&self, id: &UserId) -> Result<bool, ProxyError> {
        (**self).remove_user(id).await
    }

    #[inline]
    async fn read_live_counters(&self, id: &UserId) -> Result<Counters, ProxyError> {
        (**self).read_live_counters(id).await
    }

    #[inline]
    async fn read_counters(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<Result<Counters, ProxyError>>, ProxyError> {
        (**self).read_counters(ids).await
    }

    #[inline]
    async fn apply_node_info(&self, node: &NodeInfo) -> Result<(), ProxyError> {
        (**self).apply_node_info(node).await
    }

    #[inline]
    async fn write_config(&self) -> Result<(), ProxyError> {
        (**self).write_config().await
    }

    #[inline]
    async fn restart(&self) -> Result<(), ProxyError> {
        (**self).restart().await
    }
}
