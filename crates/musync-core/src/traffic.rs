//! Cumulative traffic counters and reportable deltas.

use serde::{Deserialize, Serialize};

/// Cumulative upload/download byte counters for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub upload: u64,
    pub download: u64,
}

impl Counters {
    #[inline]
    pub const fn new(upload: u64, download: u64) -> Self {
        Self { upload, download }
    }

    /// Combined upload + download, saturating at `u64::MAX`.
    #[inline]
    pub fn total(&self) -> u64 {
        self.upload.saturating_add(self.download)
    }

    /// Traffic accrued since `baseline`.
    ///
    /// Neither direction goes negative. When one direction went backwards
    /// its shortfall is taken off the other, so the delta's total never
    /// exceeds the growth of [`total`](Self::total).
    pub fn delta_since(&self, baseline: Counters) -> TrafficDelta {
        let (upload, download) = match (
            self.upload.checked_sub(baseline.upload),
            self.download.checked_sub(baseline.download),
        ) {
            (Some(up), Some(down)) => (up, down),
            (None, Some(down)) => (0, down.saturating_sub(baseline.upload - self.upload)),
            (Some(up), None) => (up.saturating_sub(baseline.download - self.download), 0),
            (None, None) => (0, 0),
        };
        TrafficDelta { upload, download }
    }
}

/// Traffic to report for one user in one accounting pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficDelta {
    pub upload: u64,
    pub download: u64,
}

impl TrafficDelta {
    #[inline]
    pub fn total(&self) -> u64 {
        self.upload.saturating_add(self.download)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.upload == 0 && self.download == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_since_baseline() {
        let delta = Counters::new(100, 50).delta_since(Counters::new(80, 40));
        assert_eq!(delta, TrafficDelta { upload: 20, download: 10 });
        assert_eq!(delta.total(), 30);
    }

    #[test]
    fn backwards_direction_is_taken_off_the_other() {
        // Total grew by 390, but upload went backwards by 10.
        let delta = Counters::new(10, 500).delta_since(Counters::new(20, 100));
        assert_eq!(delta, TrafficDelta { upload: 0, download: 390 });

        let delta = Counters::new(300, 5).delta_since(Counters::new(100, 50));
        assert_eq!(delta, TrafficDelta { upload: 155, download: 0 });
    }

    #[test]
    fn delta_never_negative() {
        let delta = Counters::new(1, 1).delta_since(Counters::new(5, 5));
        assert!(delta.is_zero());
        let delta = Counters::new(2, 100).delta_since(Counters::new(50, 10));
        assert_eq!(delta, TrafficDelta { upload: 0, download: 42 });
        let delta = Counters::new(2, 10).delta_since(Counters::new(50, 10));
        assert!(delta.is_zero());
    }

    #[test]
    fn total_saturates() {
        assert_eq!(Counters::new(u64::MAX, 1).total(), u64::MAX);
    }
}
