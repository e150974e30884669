use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

pub const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

#[must_use]
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}

/// Result of one request attempt.
///
/// `status` is the HTTP status code, or `0` when no response was received
/// (the request could not be built or the transport failed). Any non-zero
/// status counts as succeeded, including 4xx and 5xx: "succeeded" means the
/// target answered, not that it answered with 2xx.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: u16,
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,
    #[serde(rename = "responseBodyMB")]
    pub response_body_mb: f64,
}

impl Outcome {
    pub const FAILED_STATUS: u16 = 0;

    /// No response was obtained.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            status: Self::FAILED_STATUS,
            response_time_ms: 0,
            response_body_mb: 0.0,
        }
    }

    /// A response arrived but its body could not be read to the end.
    #[must_use]
    pub fn body_unread(status: u16, elapsed: Duration) -> Self {
        Self {
            status,
            response_time_ms: duration_ms(elapsed),
            response_body_mb: 0.0,
        }
    }

    #[must_use]
    pub fn completed(status: u16, elapsed: Duration, body_bytes: u64) -> Self {
        Self {
            status,
            response_time_ms: duration_ms(elapsed),
            response_body_mb: bytes_to_megabytes(body_bytes),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status > Self::FAILED_STATUS
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Completion signal for the progress reporter, one per request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSignal {
    Response,
    Failure,
}

impl From<&Outcome> for ProgressSignal {
    fn from(outcome: &Outcome) -> Self {
        if outcome.is_success() {
            ProgressSignal::Response
        } else {
            ProgressSignal::Failure
        }
    }
}

/// Wall-clock and monotonic start of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    pub started_at: DateTime<Local>,
    pub start: Instant,
}

impl RunClock {
    #[must_use]
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
            start: Instant::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub duration: Duration,
    pub total_requests: u64,
    pub succeeded_requests: u64,
    pub failed_requests: u64,
    pub transferred_mb: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub avg_latency_ms: u64,
    pub p50_latency_ms: u64,
    pub p90_latency_ms: u64,
    pub p99_latency_ms: u64,
    pub status_counts: BTreeMap<u16, u64>,
}

impl MetricsSummary {
    /// Succeeded requests per second of total run time, `0.0` for an empty duration.
    #[must_use]
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.succeeded_requests as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug)]
pub struct MetricsReport {
    pub summary: MetricsSummary,
    pub outcomes: Vec<Outcome>,
}
