//! Point-in-time snapshots and JSON export

use crate::Registry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every metric value at one instant, ordered by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Counter values
    pub counters: BTreeMap<String, u64>,
    /// Gauge values
    pub gauges: BTreeMap<String, i64>,
    /// Histogram summaries
    pub histograms: BTreeMap<String, HistogramSummary>,
}

/// Histogram state as plain numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    /// Total observation count
    pub count: u64,
    /// Sum of observations
    pub sum: u64,
    /// Mean value
    pub mean: f64,
    /// Largest observation
    pub max: u64,
    /// `(upper bound, count)` per bucket; `None` is the overflow bucket
    pub buckets: Vec<(Option<u64>, u64)>,
}

impl MetricsSnapshot {
    /// Capture the current values of `registry`
    pub fn from_registry(registry: &Registry) -> Self {
        let mut snapshot = Self::default();
        registry.for_each_counter(|name, value| {
            snapshot.counters.insert(name.to_string(), value);
        });
        registry.for_each_gauge(|name, value| {
            snapshot.gauges.insert(name.to_string(), value);
        });
        registry.for_each_histogram(|name, histogram| {
            snapshot.histograms.insert(name.to_string(), histogram.summary());
        });
        snapshot
    }

    /// Export snapshot as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export snapshot as compact JSON string
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Histogram;

    #[test]
    fn test_snapshot_json() {
        let registry = Registry::new();
        registry.counter("admitted.deliver", 100);
        registry.gauge("block.height", 5);
        registry.observe("gas_used.deliver", 50_000, Histogram::gas);

        let snapshot = MetricsSnapshot::from_registry(&registry);
        let json = snapshot.to_json().unwrap();

        assert!(json.contains("admitted.deliver"));
        assert!(json.contains("block.height"));
        assert!(json.contains("gas_used.deliver"));

        let parsed: MetricsSnapshot = serde_json::from_str(&snapshot.to_json_compact().unwrap()).unwrap();
        assert_eq!(parsed.counters["admitted.deliver"], 100);
        assert_eq!(parsed.histograms["gas_used.deliver"].max, 50_000);
    }
}
