use crate::metrics::MetricsSummary;

/// Human-readable recap of a finished run.
#[must_use]
pub fn summary_lines(summary: &MetricsSummary) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push("Summary:".to_owned());
    lines.push(format!("  Total requests:  {}", summary.total_requests));
    lines.push(format!(
        "  Succeeded:       {} (response received)",
        summary.succeeded_requests
    ));
    lines.push(format!(
        "  Failed:          {} (no response)",
        summary.failed_requests
    ));
    lines.push(format!(
        "  Total time:      {:.2} seconds",
        summary.duration.as_secs_f64()
    ));
    lines.push(format!(
        "  Requests/sec:    {:.2}",
        summary.requests_per_second()
    ));
    lines.push(format!("  Transferred:     {:.4} MB", summary.transferred_mb));
    lines.push(format!(
        "  Latency (ms):    min {} / avg {} / max {}",
        summary.min_latency_ms, summary.avg_latency_ms, summary.max_latency_ms
    ));
    lines.push(format!(
        "  Percentiles:     p50 {} / p90 {} / p99 {}",
        summary.p50_latency_ms, summary.p90_latency_ms, summary.p99_latency_ms
    ));
    if !summary.status_counts.is_empty() {
        lines.push("  Status codes:".to_owned());
        for (status, count) in &summary.status_counts {
            let label = if *status == 0 {
                "no response".to_owned()
            } else {
                status.to_string()
            };
            lines.push(format!("    {}: {}", label, count));
        }
    }
    lines
}
