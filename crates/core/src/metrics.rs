//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Monitoring workers (iterations, publishes)
//! - Worker registry and fleet event dispatch
//! - External services (thumbnail source, scorer, metrics backend, inventory)

use std::time::Instant;

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Monitoring Worker Metrics
// =============================================================================

/// Worker iterations total by outcome.
pub static ITERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "framewatch_iterations_total",
            "Total sampling iterations by outcome",
        ),
        &["outcome"], // "sample_unavailable", "score_unavailable", "baseline", "published", "publish_failed"
    )
    .unwrap()
});

/// Iteration duration in seconds (sample + score + publish, without the wait).
pub static ITERATION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "framewatch_iteration_duration_seconds",
            "Duration of one sampling iteration",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    )
    .unwrap()
});

/// Publish attempts total by result.
pub static PUBLISH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "framewatch_publish_attempts_total",
            "Total metric publish attempts",
        ),
        &["result"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Registry and Dispatch Metrics
// =============================================================================

/// Registry operations total.
pub static REGISTRY_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "framewatch_registry_operations_total",
            "Worker registry start/stop operations",
        ),
        &["operation", "result"], // start: "started"/"skipped", stop: "stopped"/"absent"
    )
    .unwrap()
});

/// Fleet events processed by resulting action.
pub static FLEET_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("framewatch_fleet_events_total", "Fleet events processed"),
        &["action"], // "start", "stop", "ignored", "malformed"
    )
    .unwrap()
});

/// Failed queue receive calls.
pub static QUEUE_RECEIVE_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "framewatch_queue_receive_errors_total",
        "Failed event queue receive calls",
    )
    .unwrap()
});

/// Failed message acknowledgements.
pub static QUEUE_ACK_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "framewatch_queue_ack_errors_total",
        "Failed event queue acknowledgements",
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "framewatch_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "framewatch_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one external service call.
pub fn record_external_call(service: &str, operation: &str, started: Instant, ok: bool) {
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(started.elapsed().as_secs_f64());
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, if ok { "success" } else { "error" }])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Workers
        Box::new(ITERATIONS.clone()),
        Box::new(ITERATION_DURATION.clone()),
        Box::new(PUBLISH_ATTEMPTS.clone()),
        // Registry and dispatch
        Box::new(REGISTRY_OPERATIONS.clone()),
        Box::new(FLEET_EVENTS.clone()),
        Box::new(QUEUE_RECEIVE_ERRORS.clone()),
        Box::new(QUEUE_ACK_ERRORS.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
