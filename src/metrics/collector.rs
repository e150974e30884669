use std::collections::BTreeMap;

use chrono::Local;
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};
use tracing::{debug, warn};

use super::{LatencyHistogram, MetricsReport, MetricsSummary, Outcome, RunClock};

/// Upper bound on the up-front reservation for outcome records. Larger runs
/// grow the buffer as records arrive.
const PREALLOCATED_OUTCOMES: usize = 1 << 16;

/// Drains the results channel until every sender is gone.
///
/// The end timestamp is taken once the channel has been fully drained.
#[must_use]
pub fn setup_outcome_collector(
    clock: RunClock,
    mut results_rx: mpsc::Receiver<Outcome>,
    expected: usize,
) -> JoinHandle<MetricsReport> {
    tokio::spawn(async move {
        let mut aggregator = Aggregator::with_capacity(expected);
        while let Some(outcome) = results_rx.recv().await {
            aggregator.consume(outcome);
        }
        aggregator.finish(clock, Instant::now())
    })
}

/// Commutative reduction over outcome records.
#[derive(Debug)]
pub struct Aggregator {
    outcomes: Vec<Outcome>,
    succeeded: u64,
    failed: u64,
    transferred_mb: f64,
    latency_min_ms: u64,
    latency_max_ms: u64,
    latency_sum_ms: u128,
    histogram: Option<LatencyHistogram>,
    status_counts: BTreeMap<u16, u64>,
}

impl Aggregator {
    #[must_use]
    pub fn with_capacity(expected: usize) -> Self {
        let histogram = match LatencyHistogram::new() {
            Ok(histogram) => Some(histogram),
            Err(err) => {
                warn!("Latency percentiles disabled: {}", err);
                None
            }
        };
        Self {
            outcomes: Vec::with_capacity(expected.min(PREALLOCATED_OUTCOMES)),
            succeeded: 0,
            failed: 0,
            transferred_mb: 0.0,
            latency_min_ms: u64::MAX,
            latency_max_ms: 0,
            latency_sum_ms: 0,
            histogram,
            status_counts: BTreeMap::new(),
        }
    }

    pub fn consume(&mut self, outcome: Outcome) {
        if outcome.is_success() {
            self.succeeded = self.succeeded.saturating_add(1);
            let latency = outcome.response_time_ms;
            self.latency_min_ms = self.latency_min_ms.min(latency);
            self.latency_max_ms = self.latency_max_ms.max(latency);
            self.latency_sum_ms = self.latency_sum_ms.saturating_add(u128::from(latency));
            if let Some(histogram) = self.histogram.as_mut()
                && let Err(err) = histogram.record(latency)
            {
                debug!("{}", err);
            }
        } else {
            self.failed = self.failed.saturating_add(1);
        }
        let count = self.status_counts.entry(outcome.status).or_insert(0);
        *count = count.saturating_add(1);
        self.transferred_mb += outcome.response_body_mb;
        self.outcomes.push(outcome);
    }

    #[must_use]
    pub fn finish(self, clock: RunClock, ended: Instant) -> MetricsReport {
        let duration = ended.saturating_duration_since(clock.start);
        let ended_at = clock
            .started_at
            .checked_add_signed(chrono::Duration::from_std(duration).unwrap_or_default())
            .unwrap_or_else(Local::now);

        let avg_latency_ms = self
            .latency_sum_ms
            .checked_div(u128::from(self.succeeded))
            .map_or(0, |avg| u64::try_from(avg).unwrap_or(u64::MAX));
        let (p50_latency_ms, p90_latency_ms, p99_latency_ms) = self
            .histogram
            .as_ref()
            .map_or((0, 0, 0), LatencyHistogram::percentiles);
        let min_latency_ms = if self.succeeded == 0 {
            0
        } else {
            self.latency_min_ms
        };

        let summary = MetricsSummary {
            started_at: clock.started_at,
            ended_at,
            duration,
            total_requests: self.succeeded.saturating_add(self.failed),
            succeeded_requests: self.succeeded,
            failed_requests: self.failed,
            transferred_mb: self.transferred_mb,
            min_latency_ms,
            max_latency_ms: self.latency_max_ms,
            avg_latency_ms,
            p50_latency_ms,
            p90_latency_ms,
            p99_latency_ms,
            status_counts: self.status_counts,
        };

        MetricsReport {
            summary,
            outcomes: self.outcomes,
        }
    }
}
