//! Telemetry: structured logging, request spans and Prometheus metrics.

mod logging;
pub mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metrics::{
    endpoint, EndpointStats, MetricsError, MetricsRecorder, MetricsSnapshot, TEXT_CONTENT_TYPE,
};
pub use spans::{ErrorCode, RequestSpan, SpanExt};
