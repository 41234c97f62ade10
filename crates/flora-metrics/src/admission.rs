//! Admission-specific recording on top of [`Registry`]

use crate::{Histogram, MetricsSnapshot, Registry};
use std::sync::Arc;
use std::time::Duration;

/// Records admission outcomes.
///
/// Metric names are dotted: `admitted.<mode>`, `rejected.<mode>`,
/// `rejected.kind.<kind>`, `rejected.stage.<stage>`, `gas_used.<mode>`,
/// `latency_us.<mode>`, `commits`, `block.height`.
#[derive(Clone, Default)]
pub struct AdmissionMetrics {
    registry: Arc<Registry>,
}

impl AdmissionMetrics {
    /// Create with a fresh registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a successful run
    pub fn record_admitted(&self, mode: &str, gas_used: u64, elapsed: Duration) {
        self.registry.counter(&format!("admitted.{mode}"), 1);
        self.record_run(mode, gas_used, elapsed);
    }

    /// Record a rejected run
    pub fn record_rejected(&self, mode: &str, stage: &str, kind: &str, gas_used: u64, elapsed: Duration) {
        self.registry.counter(&format!("rejected.{mode}"), 1);
        self.registry.counter(&format!("rejected.kind.{kind}"), 1);
        self.registry.counter(&format!("rejected.stage.{stage}"), 1);
        self.record_run(mode, gas_used, elapsed);
    }

    /// Record a committed write set
    pub fn record_commit(&self) {
        self.registry.counter("commits", 1);
    }

    /// Record the current block height
    pub fn set_height(&self, height: u64) {
        self.registry.gauge("block.height", height.min(i64::MAX as u64) as i64);
    }

    /// Admitted count for a mode
    pub fn admitted(&self, mode: &str) -> u64 {
        self.registry.get_counter(&format!("admitted.{mode}"))
    }

    /// Rejected count for a mode
    pub fn rejected(&self, mode: &str) -> u64 {
        self.registry.get_counter(&format!("rejected.{mode}"))
    }

    /// Rejected count for an error kind
    pub fn rejected_kind(&self, kind: &str) -> u64 {
        self.registry.get_counter(&format!("rejected.kind.{kind}"))
    }

    /// Committed write sets
    pub fn commits(&self) -> u64 {
        self.registry.get_counter("commits")
    }

    /// Snapshot everything
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_registry(&self.registry)
    }

    fn record_run(&self, mode: &str, gas_used: u64, elapsed: Duration) {
        self.registry
            .observe(&format!("gas_used.{mode}"), gas_used, Histogram::gas);
        let micros = elapsed.as_micros().min(u64::MAX as u128) as u64;
        self.registry
            .observe(&format!("latency_us.{mode}"), micros, Histogram::latency_micros);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_counters() {
        let metrics = AdmissionMetrics::new();
        metrics.record_admitted("deliver", 60_000, Duration::from_micros(80));
        metrics.record_rejected("deliver", "sig_verify", "wrong_sequence", 1_200, Duration::from_micros(20));
        metrics.record_rejected("check", "min_gas_price", "price_too_low", 0, Duration::from_micros(5));
        metrics.record_commit();

        assert_eq!(metrics.admitted("deliver"), 1);
        assert_eq!(metrics.rejected("deliver"), 1);
        assert_eq!(metrics.rejected("check"), 1);
        assert_eq!(metrics.rejected_kind("wrong_sequence"), 1);
        assert_eq!(metrics.commits(), 1);

        let gas = metrics
            .registry()
            .with_histogram("gas_used.deliver", |h| (h.total_count(), h.max()));
        assert_eq!(gas, Some((2, 60_000)));
    }

    #[test]
    fn test_height_gauge() {
        let metrics = AdmissionMetrics::new();
        metrics.set_height(12);
        assert_eq!(metrics.snapshot().gauges["block.height"], 12);
    }
}
