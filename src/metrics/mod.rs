//! Outcome records, aggregation, and latency histogram utilities.
mod collector;
mod histogram;
mod types;


pub use collector::{Aggregator, setup_outcome_collector};
pub use histogram::LatencyHistogram;
pub use types::{
    BYTES_PER_MEGABYTE, MetricsReport, MetricsSummary, Outcome, ProgressSignal, RunClock,
    bytes_to_megabytes,
};
