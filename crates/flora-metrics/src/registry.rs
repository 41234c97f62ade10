//! Named metric registry

use crate::Histogram;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Counters, gauges and histograms keyed by name, created on first write
#[derive(Default)]
pub struct Registry {
    counters: DashMap<String, AtomicU64>,
    gauges: DashMap<String, AtomicI64>,
    histograms: DashMap<String, Histogram>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to a counter
    pub fn counter(&self, name: &str, delta: u64) {
        match self.counters.get(name) {
            Some(counter) => counter.fetch_add(delta, Ordering::Relaxed),
            None => self
                .counters
                .entry(name.to_string())
                .or_default()
                .fetch_add(delta, Ordering::Relaxed),
        };
    }

    /// Set a gauge
    pub fn gauge(&self, name: &str, value: i64) {
        match self.gauges.get(name) {
            Some(gauge) => gauge.store(value, Ordering::Relaxed),
            None => self
                .gauges
                .entry(name.to_string())
                .or_default()
                .store(value, Ordering::Relaxed),
        }
    }

    /// Record into a histogram, building it with `make` on first use
    pub fn observe(&self, name: &str, value: u64, make: fn() -> Histogram) {
        match self.histograms.get(name) {
            Some(histogram) => histogram.observe(value),
            None => self
                .histograms
                .entry(name.to_string())
                .or_insert_with(make)
                .observe(value),
        }
    }

    /// Counter value, 0 when never incremented
    pub fn get_counter(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    /// Gauge value
    pub fn get_gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).map(|gauge| gauge.load(Ordering::Relaxed))
    }

    /// Apply `f` to a histogram if it exists
    pub fn with_histogram<R>(&self, name: &str, f: impl FnOnce(&Histogram) -> R) -> Option<R> {
        self.histograms.get(name).map(|histogram| f(&histogram))
    }

    pub(crate) fn for_each_counter(&self, mut f: impl FnMut(&str, u64)) {
        for entry in self.counters.iter() {
            f(entry.key(), entry.value().load(Ordering::Relaxed));
        }
    }

    pub(crate) fn for_each_gauge(&self, mut f: impl FnMut(&str, i64)) {
        for entry in self.gauges.iter() {
            f(entry.key(), entry.value().load(Ordering::Relaxed));
        }
    }

    pub(crate) fn for_each_histogram(&self, mut f: impl FnMut(&str, &Histogram)) {
        for entry in self.histograms.iter() {
            f(entry.key(), entry.value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let registry = Registry::new();
        registry.counter("rejected.kind.out_of_gas", 1);
        registry.counter("rejected.kind.out_of_gas", 2);
        assert_eq!(registry.get_counter("rejected.kind.out_of_gas"), 3);
        assert_eq!(registry.get_counter("commits"), 0);
    }

    #[test]
    fn test_gauge_overwrites() {
        let registry = Registry::new();
        assert_eq!(registry.get_gauge("block.height"), None);
        registry.gauge("block.height", 42);
        registry.gauge("block.height", 7);
        assert_eq!(registry.get_gauge("block.height"), Some(7));
    }

    #[test]
    fn test_histogram_built_once() {
        let registry = Registry::new();
        registry.observe("gas_used.check", 100, Histogram::gas);
        registry.observe("gas_used.check", 200, Histogram::gas);
        assert_eq!(registry.with_histogram("gas_used.check", Histogram::total_count), Some(2));
        assert_eq!(registry.with_histogram("gas_used.check", Histogram::mean), Some(150.0));
        assert_eq!(registry.with_histogram("gas_used.deliver", Histogram::mean), None);
    }
}
