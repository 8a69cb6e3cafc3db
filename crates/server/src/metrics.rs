//! Prometheus metrics
//!
//! Gateway latencies, request counts and error counts, rendered at `/metrics`.

use axum::http::StatusCode;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder
///
/// Safe to call more than once; later calls return the existing handle.
pub fn init_metrics() -> Option<PrometheusHandle> {
    PROMETHEUS
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map_err(|e| tracing::warn!(error = %e, "Failed to install Prometheus recorder"))
        .ok()
        .cloned()
}

pub fn record_stt_latency(elapsed: Duration) {
    metrics::histogram!("examiner_stt_latency_seconds").record(elapsed.as_secs_f64());
}

pub fn record_llm_latency(kind: &'static str, elapsed: Duration) {
    metrics::histogram!("examiner_llm_latency_seconds", "kind" => kind)
        .record(elapsed.as_secs_f64());
}

pub fn record_tts_latency(elapsed: Duration) {
    metrics::histogram!("examiner_tts_latency_seconds").record(elapsed.as_secs_f64());
}

pub fn record_request(endpoint: &'static str, status: u16) {
    metrics::counter!(
        "examiner_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_error(endpoint: &'static str) {
    metrics::counter!("examiner_errors_total", "endpoint" => endpoint).increment(1);
}

/// GET /metrics
pub async fn metrics_handler() -> (StatusCode, String) {
    match PROMETHEUS.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
