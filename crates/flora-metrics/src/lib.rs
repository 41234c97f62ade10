//! # flora-metrics
//!
//! Admission metrics for Flora.
//!
//! Features:
//! - Bucketed histograms for gas used and admission latency
//! - Counters per mode, stage and error kind
//! - Gauges for the current block
//! - JSON export

#![warn(missing_docs)]
#![warn(clippy::all)]

mod admission;
mod export;
mod histogram;
mod registry;

pub use admission::AdmissionMetrics;
pub use export::{HistogramSummary, MetricsSnapshot};
pub use histogram::Histogram;
pub use registry::Registry;
