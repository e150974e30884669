//! Run context and orchestration of a single load test.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::args::{HttpMethod, PositiveUsize};
use crate::error::{AppResult, HttpError};
use crate::http::{ReqwestTransport, Transport, build_client, setup_dispatcher};
use crate::metrics::{MetricsSummary, RunClock, setup_outcome_collector};
use crate::progress::{ProgressOptions, ProgressTally, setup_progress_reporter};
use crate::report::TestOutput;
use crate::shutdown::ShutdownSender;

/// Upper bound for buffered outcome records; the collector drains concurrently.
const RESULTS_CHANNEL_CAPACITY: usize = 1024;

/// Resolved, immutable parameters of one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub amount: PositiveUsize,
    pub worker: PositiveUsize,
    pub method: HttpMethod,
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub request_timeout: Option<Duration>,
}

/// Everything a run needs, passed explicitly so independent runs can share a
/// process.
#[derive(Clone)]
pub struct RunContext {
    pub config: RunConfig,
    pub transport: Arc<dyn Transport>,
    pub progress: ProgressOptions,
}

impl RunContext {
    #[must_use]
    pub fn new(config: RunConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            progress: ProgressOptions::default(),
        }
    }

    /// Builds a context around a pooled reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn with_reqwest(config: RunConfig) -> Result<Self, HttpError> {
        let client = build_client(&config)?;
        Ok(Self::new(config, Arc::new(ReqwestTransport::new(client))))
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressOptions) -> Self {
        self.progress = progress;
        self
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub summary: MetricsSummary,
    pub progress: ProgressTally,
    pub output: TestOutput,
}

/// Executes every request of the run and aggregates the outcomes.
///
/// # Errors
///
/// Returns an error only when one of the run's own tasks panics. Request
/// failures are part of the report.
pub async fn execute_run(context: &RunContext, shutdown_tx: &ShutdownSender) -> AppResult<RunReport> {
    let config = &context.config;
    let amount = config.amount.get();

    info!(
        "Sending {} {} request(s) to {} with {} worker(s).",
        amount,
        config.method.as_str(),
        config.endpoint,
        config.worker.get()
    );

    let clock = RunClock::start();
    let (results_tx, results_rx) = mpsc::channel(RESULTS_CHANNEL_CAPACITY.min(amount));
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();

    let progress_handle = setup_progress_reporter(amount, context.progress, progress_rx);
    let collector_handle = setup_outcome_collector(clock, results_rx, amount);
    let dispatcher_handle = setup_dispatcher(
        config,
        Arc::clone(&context.transport),
        shutdown_tx,
        results_tx,
        progress_tx,
    );

    let dispatched = dispatcher_handle.await?;
    let report = collector_handle.await?;
    let progress = progress_handle.await?;

    if dispatched < amount {
        warn!(
            "Run stopped early: {} of {} requests completed.",
            dispatched, amount
        );
    }
    debug!(
        "Collected {} outcome(s); progress saw {} completion(s).",
        report.outcomes.len(),
        progress.completed
    );

    let summary = report.summary.clone();
    let output = TestOutput::new(config, report);
    Ok(RunReport {
        summary,
        progress,
        output,
    })
}
