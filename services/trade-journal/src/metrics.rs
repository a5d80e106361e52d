//! Prometheus metrics for the trade journal
//!
//! Recording goes through the `metrics` facade, so calls are no-ops until a
//! recorder is installed.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::errors::{JournalError, JournalResult};

/// Install the global Prometheus recorder and register descriptions
pub fn install_recorder() -> JournalResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| JournalError::Config(format!("failed to install metrics recorder: {e}")))?;

    register_metrics();
    Ok(handle)
}

fn register_metrics() {
    describe_counter!("journal_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "journal_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "journal_trades_written_total",
        "Trade writes by operation (create, update, delete)"
    );
    describe_counter!(
        "journal_price_feed_refresh_total",
        "Price feed refresh attempts by outcome"
    );
}

/// Record one served HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    counter!("journal_http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("journal_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration);
}

/// Record a successful trade write
pub fn record_trade_write(op: &'static str) {
    counter!("journal_trades_written_total", "op" => op).increment(1);
}

/// Record a price feed refresh attempt
pub fn record_feed_refresh(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("journal_price_feed_refresh_total", "outcome" => outcome).increment(1);
}
