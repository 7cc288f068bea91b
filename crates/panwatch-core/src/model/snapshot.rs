// ── Refresh snapshot ──
//
// One immutable result of a refresh cycle. A new snapshot replaces the
// previous one wholesale; fields are never merged across cycles.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{AsRefStr, Display};

use super::rule::SecurityRule;

/// The sub-fetch a [`FetchError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DataplaneCpu,
    SystemInfo,
    SessionInfo,
    ManagementCpu,
    Routes,
    BgpPeers,
}

/// A degraded sub-fetch: the metric fell back to its sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchError {
    pub metric: Metric,
    pub message: String,
}

/// Everything one refresh learned about the firewall.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Security rules keyed by name. Duplicate names collide; the last
    /// entry in rulebase order wins.
    pub rules: BTreeMap<String, SecurityRule>,
    /// Mean load of active dataplane cores. `None` if the resource
    /// monitor could not be read.
    pub dataplane_cpu_percent: Option<f64>,
    /// Management plane CPU. `None` if unreadable.
    pub management_cpu_percent: Option<i64>,
    pub concurrent_connections: u64,
    pub connections_per_second: u64,
    pub total_throughput_kbps: u64,
    /// Flattened `show system info`, keys sanitized.
    pub system_info: BTreeMap<String, String>,
    pub number_of_routes: u64,
    pub bgp_peers: u64,
    pub refreshed_at: DateTime<Utc>,
    pub errors: Vec<FetchError>,
}

impl Snapshot {
    pub fn rule(&self, name: &str) -> Option<&SecurityRule> {
        self.rules.get(name)
    }

    /// Throughput in Mbps, rounded to one decimal.
    #[allow(clippy::cast_precision_loss)]
    pub fn total_throughput_mbps(&self) -> f64 {
        (self.total_throughput_kbps as f64 / 1000.0 * 10.0).round() / 10.0
    }

    /// Whether the given sub-fetch degraded in this cycle.
    pub fn is_degraded(&self, metric: Metric) -> bool {
        self.errors.iter().any(|e| e.metric == metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_displays_in_mbps() {
        let snap = Snapshot {
            total_throughput_kbps: 2500,
            ..Snapshot::default()
        };
        assert!((snap.total_throughput_mbps() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn throughput_rounds_to_one_decimal() {
        let snap = Snapshot {
            total_throughput_kbps: 1234,
            ..Snapshot::default()
        };
        assert!((snap.total_throughput_mbps() - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn metric_names_are_snake_case() {
        assert_eq!(Metric::BgpPeers.to_string(), "bgp_peers");
        assert_eq!(Metric::DataplaneCpu.as_ref(), "dataplane_cpu");
    }
}
