//! Metrics definitions for the token service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `token_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `operation`: 3 values (obtain, refresh, verify)
//! - `status`: 2 values (success, error)
//! - `code`: bounded by the `ValidationError`/`ExchangeError` codes

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle served on
/// `/metrics`.
///
/// # Errors
///
/// Returns error if a recorder is already installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Exchanges are dominated by bcrypt on obtain; decode/sign otherwise
        .set_buckets_for_metric(
            Matcher::Prefix("token_issuance".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.350, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record exchange duration and outcome.
///
/// Metrics: `token_issuance_duration_seconds`, `token_issuance_total`
/// Labels: `operation`, `status`
pub fn record_token_issuance(operation: &str, status: &str, duration: Duration) {
    histogram!("token_issuance_duration_seconds", "operation" => operation.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("token_issuance_total", "operation" => operation.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a failed exchange by error code.
///
/// Metric: `token_validation_failures_total`
/// Labels: `operation`, `code`
pub fn record_validation_failure(operation: &str, code: &str) {
    counter!("token_validation_failures_total", "operation" => operation.to_string(), "code" => code.to_string())
        .increment(1);
}
