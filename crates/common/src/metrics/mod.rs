//! Metrics and observability utilities
//!
//! Prometheus metrics with latency histograms and standardized naming.
//! Everything is recorded through the `metrics` facade; the gateway
//! installs the exporter.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all e-consultation metrics
pub const METRICS_PREFIX: &str = "econsult";

/// Histogram buckets for HTTP request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
];

/// Buckets for outbound ML calls (summarization is slow)
pub const ML_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_rate_limited_total", METRICS_PREFIX),
        Unit::Count,
        "Requests rejected by the rate limiter"
    );

    // Submission metrics
    describe_counter!(
        format!("{}_submissions_total", METRICS_PREFIX),
        Unit::Count,
        "Comments stored, by bill and channel"
    );

    describe_counter!(
        format!("{}_submissions_blocked_total", METRICS_PREFIX),
        Unit::Count,
        "Comments refused by the input guardrails"
    );

    describe_counter!(
        format!("{}_enrichment_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Comments stored with a default sentiment or summary after an ML failure"
    );

    // ML metrics
    describe_counter!(
        format!("{}_ml_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total ML service requests"
    );

    describe_histogram!(
        format!("{}_ml_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "ML service latency in seconds"
    );

    // Overview metrics
    describe_counter!(
        format!("{}_overview_generations_total", METRICS_PREFIX),
        Unit::Count,
        "Overview regenerations, by bill and scope"
    );

    describe_histogram!(
        format!("{}_overview_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Overview regeneration latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record one outbound ML call
pub fn record_ml_call(endpoint: &str, duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_ml_requests_total", METRICS_PREFIX),
        "endpoint" => endpoint.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(
        format!("{}_ml_duration_seconds", METRICS_PREFIX),
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

/// Helper to record a stored comment
pub fn record_submission(bill: &str, channel: &str, sentiment: &str) {
    counter!(
        format!("{}_submissions_total", METRICS_PREFIX),
        "bill" => bill.to_string(),
        "channel" => channel.to_string(),
        "sentiment" => sentiment.to_string()
    )
    .increment(1);
}

pub fn record_blocked_submission(reason: &str) {
    counter!(
        format!("{}_submissions_blocked_total", METRICS_PREFIX),
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn record_enrichment_fallback(field: &str) {
    counter!(
        format!("{}_enrichment_fallbacks_total", METRICS_PREFIX),
        "field" => field.to_string()
    )
    .increment(1);
}

/// Helper to record an overview regeneration
pub fn record_overview(bill: &str, scope: &str, duration_secs: f64) {
    counter!(
        format!("{}_overview_generations_total", METRICS_PREFIX),
        "bill" => bill.to_string(),
        "scope" => scope.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_overview_duration_seconds", METRICS_PREFIX),
        "bill" => bill.to_string()
    )
    .record(duration_secs);
}

pub fn record_rate_limited() {
    counter!(format!("{}_rate_limited_total", METRICS_PREFIX)).increment(1);
}
