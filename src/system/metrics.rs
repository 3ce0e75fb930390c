//! Metrics collection for the Canvas gateway
//!
//! This module provides metrics collection using Prometheus, grouped by
//! concern: upstream Canvas traffic and the gateway's own HTTP surface.

use crate::core::error::Result;
use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Histogram, IntCounter};
use std::time::Instant;

/// Counters and timings for upstream Canvas API traffic
pub struct UpstreamMetrics {
    /// Total number of upstream Canvas requests started
    pub requests: IntCounter,
    /// Total number of upstream requests that ultimately failed
    pub failures: IntCounter,
    /// Total number of retry attempts against Canvas
    pub retries: IntCounter,
    /// Histogram of upstream request durations in seconds, retries included
    pub request_duration: Histogram,
}

/// Counters for the gateway's own HTTP surface
pub struct HttpMetrics {
    /// Total number of gateway requests handled
    pub requests: IntCounter,
    /// Total number of requests rejected for bad shape (missing or invalid parameters)
    pub rejected: IntCounter,
}

/// Centralized metrics collection for all gateway components
pub struct Metrics {
    /// Upstream Canvas traffic metrics
    pub upstream: UpstreamMetrics,
    /// Gateway HTTP surface metrics
    pub http: HttpMetrics,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> Result<Self> {
        Ok(Self {
            upstream: UpstreamMetrics::new()?,
            http: HttpMetrics::new()?,
        })
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> =
            Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
        &INSTANCE
    }
}

impl UpstreamMetrics {
    /// Create a new UpstreamMetrics instance with registered Prometheus metrics
    fn new() -> Result<Self> {
        Ok(Self {
            requests: register_int_counter!(
                "cg_upstream_requests_total",
                "Total number of upstream Canvas requests"
            )?,
            failures: register_int_counter!(
                "cg_upstream_failures_total",
                "Total number of failed upstream Canvas requests"
            )?,
            retries: register_int_counter!(
                "cg_upstream_retries_total",
                "Total number of upstream retry attempts"
            )?,
            request_duration: register_histogram!(
                "cg_upstream_request_duration_seconds",
                "Duration of upstream Canvas requests in seconds",
                vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
            )?,
        })
    }
}

impl HttpMetrics {
    /// Create a new HttpMetrics instance with registered Prometheus counters
    fn new() -> Result<Self> {
        Ok(Self {
            requests: register_int_counter!(
                "cg_http_requests_total",
                "Total number of gateway requests handled"
            )?,
            rejected: register_int_counter!(
                "cg_http_rejected_total",
                "Total number of requests rejected for bad shape"
            )?,
        })
    }
}

/// Timer for measuring operation duration with automatic histogram recording
pub struct Timer {
    /// Start time of the operation
    start: Instant,
    /// Histogram to record the duration when finished
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
    }
}

/// Initialize the metrics registry by creating the global metrics instance
///
/// This function should be called once during application startup so the
/// metrics endpoint exposes every series before its first increment.
pub fn init_registry() {
    // Initialize global metrics to register them
    let _ = Metrics::global();
}

/// Collect and return all metrics as a Prometheus-formatted string
///
/// The `register_*` macros register against the default registry, so that
/// is the one gathered here.
pub fn collect_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposition_includes_gateway_series() {
        init_registry();
        let output = collect_metrics();
        assert!(output.contains("cg_upstream_requests_total"));
        assert!(output.contains("cg_http_requests_total"));
        assert!(output.contains("cg_upstream_request_duration_seconds"));
    }

    #[test]
    fn test_counters_are_monotonic() {
        let metrics = Metrics::global();
        let before = metrics.upstream.retries.get();
        metrics.upstream.retries.inc();
        assert!(metrics.upstream.retries.get() > before);
    }

    #[test]
    fn test_timer_records_into_histogram() {
        let metrics = Metrics::global();
        let before = metrics.upstream.request_duration.get_sample_count();
        let timer = Timer::start(metrics.upstream.request_duration.clone());
        timer.finish();
        assert_eq!(
            metrics.upstream.request_duration.get_sample_count(),
            before + 1
        );
    }
}
