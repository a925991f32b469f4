//! Node configuration and host/bandwidth report payloads.

use serde::{Deserialize, Serialize};

/// Node-level configuration the panel declares for this host.
///
/// Compared by value between polls: any change forces the local proxy to
/// be rewritten and restarted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Panel node id.
    pub node_id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Public server address as declared by the panel.
    #[serde(default)]
    pub server: String,
    /// Traffic billing multiplier.
    #[serde(default = "default_traffic_rate")]
    pub traffic_rate: f64,
    /// Per-node speed limit in Mbps (0 = unlimited).
    #[serde(default)]
    pub speed_limit_mbps: u64,
    /// Panel node class / sort.
    #[serde(default)]
    pub sort: u32,
}

fn default_traffic_rate() -> f64 {
    1.0
}

/// Host load sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostLoad {
    /// Seconds since boot.
    pub uptime_secs: u64,
    /// 1, 5 and 15 minute load averages.
    pub load: [f64; 3],
}

impl HostLoad {
    /// Load averages as `"1m 5m 15m"`.
    pub fn load_string(&self) -> String {
        format!("{:.2} {:.2} {:.2}", self.load[0], self.load[1], self.load[2])
    }
}

/// Result of one bandwidth-quality measurement against one target.
///
/// A field is `None` when that part of the measurement failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySample {
    pub name: String,
    pub ping_ms: Option<u64>,
    pub download_mbps: Option<f64>,
    pub upload_mbps: Option<f64>,
}

/// A full bandwidth-quality measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub samples: Vec<QualitySample>,
}

impl QualityReport {
    /// `true` when every sample failed completely.
    pub fn is_empty(&self) -> bool {
        self.samples
            .iter()
            .all(|s| s.ping_ms.is_none() && s.download_mbps.is_none() && s.upload_mbps.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_string_format() {
        let load = HostLoad {
            uptime_secs: 10,
            load: [0.5, 1.25, 2.0],
        };
        assert_eq!(load.load_string(), "0.50 1.25 2.00");
    }

    #[test]
    fn node_info_defaults() {
        let node: NodeInfo = serde_json::from_str(r#"{"node_id": 3}"#).unwrap();
        assert_eq!(node.node_id, 3);
        assert!((node.traffic_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(node.speed_limit_mbps, 0);
    }

    #[test]
    fn quality_report_empty_when_all_failed() {
        let mut report = QualityReport {
            samples: vec![QualitySample {
                name: "a".into(),
                ping_ms: None,
                download_mbps: None,
                upload_mbps: None,
            }],
        };
        assert!(report.is_empty());
        report.samples[0].ping_ms = Some(12);
        assert!(!report.is_empty());
    }
}
