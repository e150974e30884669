use std::collections::BTreeMap;

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricsReport, MetricsSummary, Outcome};
use crate::run::RunConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub succeeded_requests: u64,
    pub failed_requests: u64,
    pub total_requests: u64,
    pub start_time: String,
    pub end_time: String,
    pub total_time: String,
    pub requests_per_second: f64,
    #[serde(rename = "dataTransferedInMB")]
    pub data_transferred_mb: f64,
}

impl From<&MetricsSummary> for TestResult {
    fn from(summary: &MetricsSummary) -> Self {
        Self {
            succeeded_requests: summary.succeeded_requests,
            failed_requests: summary.failed_requests,
            total_requests: summary.total_requests,
            start_time: format_timestamp(&summary.started_at),
            end_time: format_timestamp(&summary.ended_at),
            total_time: format!("{:.2} seconds", summary.duration.as_secs_f64()),
            requests_per_second: summary.requests_per_second(),
            data_transferred_mb: summary.transferred_mb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSettings {
    pub amount: usize,
    pub worker: usize,
    pub host: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
}

impl From<&RunConfig> for TestSettings {
    fn from(config: &RunConfig) -> Self {
        Self {
            amount: config.amount.get(),
            worker: config.worker.get(),
            host: config.endpoint.clone(),
            query: config.query.clone(),
            headers: config.headers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutput {
    pub result: TestResult,
    pub settings: TestSettings,
    #[serde(rename = "request")]
    pub requests: Vec<Outcome>,
}

impl TestOutput {
    #[must_use]
    pub fn new(config: &RunConfig, report: MetricsReport) -> Self {
        Self {
            result: TestResult::from(&report.summary),
            settings: TestSettings::from(config),
            requests: report.outcomes,
        }
    }
}

fn format_timestamp(at: &DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
