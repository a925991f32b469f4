//! Per-user traffic baselines.

use std::collections::HashMap;

use musync_core::{Counters, UserId, UserSet};

/// Last cumulative counters accounted for each user.
///
/// Owned by the accounting task. A baseline only moves forward once the
/// delta up to it has been acknowledged, or when a counter reset is
/// absorbed.
#[derive(Debug, Default)]
pub struct TrafficLedger {
    baselines: HashMap<UserId, Counters>,
}

impl TrafficLedger {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn baseline(&self, id: &UserId) -> Option<Counters> {
        self.baselines.get(id).copied()
    }

    #[inline]
    pub fn set_baseline(&mut self, id: UserId, counters: Counters) {
        self.baselines.insert(id, counters);
    }

    pub fn remove(&mut self, id: &UserId) -> Option<Counters> {
        self.baselines.remove(id)
    }

    /// Drop baselines of users no longer active. Returns how many went.
    pub fn retain_active(&mut self, active: &UserSet) -> usize {
        let before = self.baselines.len();
        self.baselines.retain(|id, _| active.contains(id.as_str()));
        before - self.baselines.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}
