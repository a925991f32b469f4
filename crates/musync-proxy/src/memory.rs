//! In-memory proxy controller.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use musync_core::{Counters, NodeInfo, UserId, UserRecord, UserSet};
use parking_lot::Mutex;

use crate::error::ProxyError;
use crate::traits::ProxyController;

/// One mutating call observed by [`MemoryProxy`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyOp {
    Add(UserId),
    Remove(UserId),
    ApplyNode(u64),
    WriteConfig,
    Restart,
}

#[derive(Debug, Default)]
struct Inner {
    users: UserSet,
    counters: HashMap<UserId, Counters>,
    node: Option<NodeInfo>,
    ops: Vec<ProxyOp>,
    fail_ids: HashSet<UserId>,
    fail_counters: HashSet<UserId>,
    fail_stats: bool,
    fail_list: bool,
    fail_write: bool,
    fail_restart: bool,
}

/// Proxy controller that keeps everything in memory.
///
/// Counters are whatever [`set_counters`](Self::set_counters) last stored
/// (zero otherwise). Failures can be injected per identity or per call.
#[derive(Debug, Default)]
pub struct MemoryProxy {
    inner: Mutex<Inner>,
}

impl MemoryProxy {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `users` already configured.
    pub fn with_users<I: IntoIterator<Item = UserRecord>>(users: I) -> Self {
        let proxy = Self::new();
        proxy.inner.lock().users = users.into_iter().collect();
        proxy
    }

    /// Set a user's live cumulative counters.
    pub fn set_counters(&self, id: impl Into<UserId>, counters: Counters) {
        self.inner.lock().counters.insert(id.into(), counters);
    }

    /// Zero every counter, as a proxy restart would.
    pub fn reset_counters(&self) {
        self.inner.lock().counters.clear();
    }

    /// Make add/remove for `id` fail with an error.
    pub fn fail_user(&self, id: impl Into<UserId>) {
        self.inner.lock().fail_ids.insert(id.into());
    }

    /// Make counter reads for `id` fail.
    pub fn fail_counters(&self, id: impl Into<UserId>) {
        self.inner.lock().fail_counters.insert(id.into());
    }

    /// Make batch counter reads fail as a whole.
    pub fn fail_stats(&self, fail: bool) {
        self.inner.lock().fail_stats = fail;
    }

    pub fn fail_list(&self, fail: bool) {
        self.inner.lock().fail_list = fail;
    }

    pub fn fail_write(&self, fail: bool) {
        self.inner.lock().fail_write = fail;
    }

    pub fn fail_restart(&self, fail: bool) {
        self.inner.lock().fail_restart = fail;
    }

    /// Clear every injected failure.
    pub fn heal(&self) {
        let mut inner = self.inner.lock();
        inner.fail_ids.clear();
        inner.fail_counters.clear();
        inner.fail_stats = false;
        inner.fail_list = false;
        inner.fail_write = false;
        inner.fail_restart = false;
    }

    /// Mutating calls observed so far.
    pub fn ops(&self) -> Vec<ProxyOp> {
        self.inner.lock().ops.clone()
    }

    /// Forget the recorded calls.
    pub fn clear_ops(&self) {
        self.inner.lock().ops.clear();
    }

    pub fn users(&self) -> UserSet {
        self.inner.lock().users.clone()
    }

    pub fn node(&self) -> Option<NodeInfo> {
        self.inner.lock().node.clone()
    }

    /// Number of successful restarts.
    pub fn restarts(&self) -> usize {
        self.inner
            .lock()
            .ops
            .iter()
            .filter(|op| **op == ProxyOp::Restart)
            .count()
    }
}

#[async_trait]
impl ProxyController for MemoryProxy {
    async fn list_active_users(&self) -> Result<UserSet, ProxyError> {
        let inner = self.inner.lock();
        if inner.fail_list {
            return Err(ProxyError::Controller("list failed".into()));
        }
        Ok(inner.users.clone())
    }

    async fn add_user(&self, user: &UserRecord) -> Result<bool, ProxyError> {
        let mut inner = self.inner.lock();
        if inner.fail_ids.contains(&user.id) {
            return Err(ProxyError::Controller(format!("add {} failed", user.id)));
        }
        if inner.users.contains(user.id.as_str()) || inner.users.by_port(user.port).is_some() {
            return Ok(false);
        }
        inner.users.insert(user.clone());
        inner.ops.push(ProxyOp::Add(user.id.clone()));
        Ok(true)
    }

    async fn remove_user(&self, id: &UserId) -> Result<bool, ProxyError> {
        let mut inner = self.inner.lock();
        if inner.fail_ids.contains(id) {
            return Err(ProxyError::Controller(format!("remove {id} failed")));
        }
        let removed = inner.users.remove(id.as_str()).is_some();
        if removed {
            inner.ops.push(ProxyOp::Remove(id.clone()));
        }
        Ok(removed)
    }

    async fn read_live_counters(&self, id: &UserId) -> Result<Counters, ProxyError> {
        let inner = self.inner.lock();
        if inner.fail_counters.contains(id) {
            return Err(ProxyError::stats(format!("counters for {id} unavailable")));
        }
        Ok(inner.counters.get(id).copied().unwrap_or_default())
    }

    async fn read_counters(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<Result<Counters, ProxyError>>, ProxyError> {
        let inner = self.inner.lock();
        if inner.fail_stats {
            return Err(ProxyError::stats("stats endpoint unavailable"));
        }
        Ok(ids
            .iter()
            .map(|id| {
                if inner.fail_counters.contains(id) {
                    Err(ProxyError::stats(format!("counters for {id} unavailable")))
                } else {
                    Ok(inner.counters.get(id).copied().unwrap_or_default())
                }
            })
            .collect())
    }

    async fn apply_node_info(&self, node: &NodeInfo) -> Result<(), ProxyError> {
        let mut inner = self.inner.lock();
        inner.node = Some(node.clone());
        inner.ops.push(ProxyOp::ApplyNode(node.node_id));
        Ok(())
    }

    async fn write_config(&self) -> Result<(), ProxyError> {
        let mut inner = self.inner.lock();
        if inner.fail_write {
            return Err(ProxyError::Controller("write failed".into()));
        }
        inner.ops.push(ProxyOp::WriteConfig);
        Ok(())
    }

    async fn restart(&self) -> Result<(), ProxyError> {
        let mut inner = self.inner.lock();
        if inner.fail_restart {
            return Err(ProxyError::Restart("restart failed".into()));
        }
        inner.ops.push(ProxyOp::Restart);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use musync_core::Credential;

    use super::*;

    fn user(id: &str, port: u16) -> UserRecord {
        UserRecord::new(id, 1, Credential::new("aes-256-gcm", "pw"), port)
    }

    #[tokio::test]
    async fn add_rejects_duplicate_identity_and_port() {
        let proxy = MemoryProxy::new();
        assert!(proxy.add_user(&user("a", 1)).await.unwrap());
        assert!(!proxy.add_user(&user("a", 2)).await.unwrap());
        assert!(!proxy.add_user(&user("b", 1)).await.unwrap());
        assert_eq!(proxy.ops(), [ProxyOp::Add("a".into())]);
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let proxy = MemoryProxy::with_users([user("a", 1)]);
        assert!(proxy.remove_user(&"a".into()).await.unwrap());
        assert!(!proxy.remove_user(&"a".into()).await.unwrap());
        assert!(proxy.users().is_empty());
    }

    #[tokio::test]
    async fn injected_failures() {
        let proxy = MemoryProxy::with_users([user("a", 1)]);
        proxy.fail_user("a");
        proxy.fail_counters("a");
        proxy.fail_write(true);
        proxy.fail_restart(true);
        proxy.fail_list(true);

        assert!(proxy.remove_user(&"a".into()).await.is_err());
        assert!(proxy.read_live_counters(&"a".into()).await.is_err());
        assert!(proxy.write_config().await.is_err());
        assert!(proxy.restart().await.is_err());
        assert!(proxy.list_active_users().await.is_err());

        proxy.heal();
        assert!(proxy.remove_user(&"a".into()).await.unwrap());
    }

    #[tokio::test]
    async fn counters_default_to_zero() {
        let proxy = MemoryProxy::new();
        proxy.set_counters("a", Counters::new(5, 6));
        assert_eq!(
            proxy.read_live_counters(&"a".into()).await.unwrap(),
            Counters::new(5, 6)
        );
        proxy.reset_counters();
        assert_eq!(
            proxy.read_live_counters(&"a".into()).await.unwrap(),
            Counters::default()
        );
    }

    #[tokio::test]
    async fn batch_read_keeps_per_user_failures() {
        let proxy = MemoryProxy::new();
        proxy.set_counters("a", Counters::new(1, 2));
        proxy.fail_counters("b");

        let ids = [UserId::from("a"), UserId::from("b")];
        let readings = proxy.read_counters(&ids).await.unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].as_ref().unwrap(), &Counters::new(1, 2));
        assert!(readings[1].is_err());

        proxy.fail_stats(true);
        assert!(proxy.read_counters(&ids).await.is_err());
    }
}
