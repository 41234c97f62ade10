//! Bucketed histogram over integer observations

use crate::export::HistogramSummary;
use std::sync::atomic::{AtomicU64, Ordering};

/// Histogram with fixed upper bounds plus an overflow bucket
pub struct Histogram {
    /// Inclusive upper bound of each bucket
    bounds: Vec<u64>,
    /// Counts per bucket; one extra slot for values above every bound
    counts: Vec<AtomicU64>,
    sum: AtomicU64,
    count: AtomicU64,
    max: AtomicU64,
}

impl Histogram {
    /// Buckets sized for gas consumed by admission
    pub fn gas() -> Self {
        Self::with_bounds(vec![
            1_000, 10_000, 25_000, 50_000, 100_000, 250_000, 1_000_000, 10_000_000,
        ])
    }

    /// Buckets sized for admission latency in microseconds
    pub fn latency_micros() -> Self {
        Self::with_bounds(vec![
            10, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000,
        ])
    }

    /// Create histogram with custom bounds; they are sorted and deduplicated
    pub fn with_bounds(mut bounds: Vec<u64>) -> Self {
        bounds.sort_unstable();
        bounds.dedup();
        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Histogram {
            bounds,
            counts,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
            max: AtomicU64::new(0),
        }
    }

    /// Record a value
    pub fn observe(&self, value: u64) {
        // saturating: fetch_add would wrap
        let _ = self
            .sum
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                Some(s.saturating_add(value))
            });
        self.count.fetch_add(1, Ordering::Relaxed);
        self.max.fetch_max(value, Ordering::Relaxed);

        let idx = self.bounds.partition_point(|bound| *bound < value);
        self.counts[idx].fetch_add(1, Ordering::Relaxed);
    }

    /// Get mean value
    pub fn mean(&self) -> f64 {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.sum.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Get total count
    pub fn total_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get largest observed value
    pub fn max(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }

    /// Point-in-time summary
    pub fn summary(&self) -> HistogramSummary {
        let mut buckets: Vec<(Option<u64>, u64)> = self
            .bounds
            .iter()
            .zip(&self.counts)
            .map(|(bound, count)| (Some(*bound), count.load(Ordering::Relaxed)))
            .collect();
        if let Some(overflow) = self.counts.last() {
            buckets.push((None, overflow.load(Ordering::Relaxed)));
        }
        HistogramSummary {
            count: self.total_count(),
            sum: self.sum.load(Ordering::Relaxed),
            mean: self.mean(),
            max: self.max(),
            buckets,
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::latency_micros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_placement() {
        let h = Histogram::with_bounds(vec![10, 100]);
        h.observe(10);
        h.observe(11);
        h.observe(1_000);

        let summary = h.summary();
        assert_eq!(summary.buckets, vec![(Some(10), 1), (Some(100), 1), (None, 1)]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.max, 1_000);
        assert_eq!(summary.sum, 1_021);
    }

    #[test]
    fn test_empty_mean() {
        assert_eq!(Histogram::gas().mean(), 0.0);
    }
}
