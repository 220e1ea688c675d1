//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Auth Metrics
    pub static ref LOGINS_STARTED_TOTAL: IntCounter = IntCounter::new(
        "keygate_logins_started_total",
        "Total number of OAuth login attempts started"
    ).expect("metric can be created");
    pub static ref CALLBACKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("keygate_callbacks_total", "Total number of OAuth callbacks by outcome"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref GATE_DECISIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("keygate_gate_decisions_total", "Auth gate decisions for protected routes"),
        &["decision"]
    ).expect("metric can be created");
    pub static ref TOKEN_EXCHANGE_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "keygate_token_exchange_duration_seconds",
            "Back-channel request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["operation", "status"]
    ).expect("metric can be created");

    // Store Metrics
    pub static ref USER_VALUES: IntGauge = IntGauge::new(
        "keygate_user_values",
        "Current number of stored user values"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("keygate_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(LOGINS_STARTED_TOTAL.clone()))
        .expect("LOGINS_STARTED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CALLBACKS_TOTAL.clone()))
        .expect("CALLBACKS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(GATE_DECISIONS_TOTAL.clone()))
        .expect("GATE_DECISIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(TOKEN_EXCHANGE_DURATION_SECONDS.clone()))
        .expect("TOKEN_EXCHANGE_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(USER_VALUES.clone()))
        .expect("USER_VALUES can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
