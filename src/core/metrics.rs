//! Prometheus metrics for monitoring the proxy.
//!
//! This module provides a centralized metrics registry for tracking inbound
//! requests, upstream latency and failures, and streamed chunk outcomes.

use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, GaugeVec, HistogramVec,
    IntCounterVec,
};
use std::sync::OnceLock;

/// Container for all application metrics.
pub struct Metrics {
    /// Total number of requests by method, endpoint, model and status
    pub request_count: IntCounterVec,

    /// Request duration histogram in seconds
    pub request_duration: HistogramVec,

    /// Number of currently active requests by endpoint
    pub active_requests: GaugeVec,

    /// Time until upstream response headers arrive, in seconds
    pub upstream_latency: HistogramVec,

    /// Upstream failures by app id and kind (`http`, `transport` or `idle_timeout`)
    pub upstream_errors: IntCounterVec,

    /// Streamed chunks by model and outcome (`emitted` or `dropped`)
    pub stream_chunks: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Initialize the metrics registry.
///
/// This should be called once at application startup. Subsequent calls will
/// return the same instance.
pub fn init_metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let request_count = register_int_counter_vec!(
            "open_anakin_requests_total",
            "Total number of requests",
            &["method", "endpoint", "model", "status_code"]
        )
        .expect("Failed to register request_count metric");

        let request_duration = register_histogram_vec!(
            "open_anakin_request_duration_seconds",
            "Request duration in seconds",
            &["method", "endpoint", "model"],
            vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
        )
        .expect("Failed to register request_duration metric");

        let active_requests = register_gauge_vec!(
            "open_anakin_active_requests",
            "Number of active requests",
            &["endpoint"]
        )
        .expect("Failed to register active_requests metric");

        let upstream_latency = register_histogram_vec!(
            "open_anakin_upstream_latency_seconds",
            "Time until the upstream response headers arrive, in seconds",
            &["app_id", "stream"],
            vec![0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]
        )
        .expect("Failed to register upstream_latency metric");

        let upstream_errors = register_int_counter_vec!(
            "open_anakin_upstream_errors_total",
            "Upstream failures by kind",
            &["app_id", "kind"]
        )
        .expect("Failed to register upstream_errors metric");

        let stream_chunks = register_int_counter_vec!(
            "open_anakin_stream_chunks_total",
            "Streamed chunks by outcome",
            &["model", "outcome"]
        )
        .expect("Failed to register stream_chunks metric");

        Metrics {
            request_count,
            request_duration,
            active_requests,
            upstream_latency,
            upstream_errors,
            stream_chunks,
        }
    })
}

/// Get the global metrics instance, initializing it on first use.
pub fn get_metrics() -> &'static Metrics {
    init_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        let a = init_metrics() as *const Metrics;
        let b = init_metrics() as *const Metrics;
        assert_eq!(a, b);
    }

    #[test]
    fn test_stream_chunk_counter() {
        let metrics = get_metrics();
        let counter = metrics
            .stream_chunks
            .with_label_values(&["metrics-test-model", "dropped"]);
        let before = counter.get();
        counter.inc();
        assert_eq!(counter.get(), before + 1);
    }
}
