//! Per-endpoint request metrics with Prometheus text export.
//!
//! The recorder owns its own `prometheus::Registry` so independent runtimes
//! (and tests) never share counters. Recording and export never fail the
//! caller: a problem in metrics must not block a prediction or a reload.

use std::collections::HashMap;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Logical endpoints tracked by the recorder.
pub mod endpoint {
    pub const HEALTH: &str = "health";
    pub const RELOAD: &str = "reload";
    pub const PREDICT: &str = "predict";
}

/// Content type for the Prometheus text exposition format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Latency buckets in seconds, sized for sub-millisecond inference.
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
}

/// Point-in-time view of one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointStats {
    pub requests: u64,
    pub latency_observations: u64,
    pub latency_sum_seconds: f64,
}

/// Point-in-time view of all endpoints, for programmatic checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub endpoints: HashMap<String, EndpointStats>,
    pub model_loads_success: u64,
    pub model_loads_failure: u64,
    pub model_loaded: bool,
}

impl MetricsSnapshot {
    /// Stats for one endpoint (zeroed if never touched).
    pub fn endpoint(&self, name: &str) -> EndpointStats {
        self.endpoints.get(name).cloned().unwrap_or_default()
    }
}

/// Counts invocations and records latency distributions per endpoint.
pub struct MetricsRecorder {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
    loads: IntCounterVec,
    model_loaded: IntGauge,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("api_requests_total", "Total API requests"),
            &["endpoint"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new("api_latency_seconds", "Request latency in seconds")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["endpoint"],
        )?;
        let loads = IntCounterVec::new(
            Opts::new("model_loads_total", "Model load attempts by outcome"),
            &["outcome"],
        )?;
        let model_loaded = IntGauge::new("model_loaded", "1 if a model is currently loaded")?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        registry.register(Box::new(loads.clone()))?;
        registry.register(Box::new(model_loaded.clone()))?;

        Ok(Self { registry, requests, latency, loads, model_loaded })
    }

    /// Count one invocation of `endpoint`.
    pub fn increment(&self, endpoint: &str) {
        self.requests.with_label_values(&[endpoint]).inc();
    }

    /// Record one latency observation for `endpoint`.
    pub fn observe_latency(&self, endpoint: &str, seconds: f64) {
        // Negative or NaN durations would poison the histogram sum.
        let seconds = if seconds.is_finite() && seconds >= 0.0 { seconds } else { 0.0 };
        self.latency.with_label_values(&[endpoint]).observe(seconds);
    }

    /// Record the outcome of a model load attempt.
    pub fn record_load(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.loads.with_label_values(&[outcome]).inc();
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.model_loaded.set(i64::from(loaded));
    }

    /// Prometheus text exposition of every metric. Does not reset state.
    pub fn export(&self) -> String {
        let families = self.registry.gather();
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&families, &mut buf) {
            warn!(error = %e, "metrics encode failed");
        }
        String::from_utf8(buf).unwrap_or_else(|e| {
            warn!(error = %e, "metrics output was not UTF-8");
            String::new()
        })
    }

    /// Structured snapshot of the same state `export` renders.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot {
            model_loaded: self.model_loaded.get() == 1,
            ..Default::default()
        };

        for family in self.registry.gather() {
            for metric in family.get_metric() {
                let label = metric
                    .get_label()
                    .first()
                    .map(|l| l.get_value().to_string())
                    .unwrap_or_default();

                match family.get_name() {
                    "api_requests_total" => {
                        let stats = snapshot.endpoints.entry(label).or_default();
                        stats.requests = metric.get_counter().get_value() as u64;
                    }
                    "api_latency_seconds" => {
                        let stats = snapshot.endpoints.entry(label).or_default();
                        let h = metric.get_histogram();
                        stats.latency_observations = h.get_sample_count();
                        stats.latency_sum_seconds = h.get_sample_sum();
                    }
                    "model_loads_total" => {
                        let value = metric.get_counter().get_value() as u64;
                        match label.as_str() {
                            "success" => snapshot.model_loads_success = value,
                            "failure" => snapshot.model_loads_failure = value,
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }
        }

        snapshot
    }
}
