//! Request span helpers.

use std::fmt::Display;

use tracing::{info_span, Span};

use crate::engine::InferenceError;
use crate::http::ApiError;
use crate::models::RegistryError;

/// Stable machine-readable code for an error, recorded as `error.code`.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

impl ErrorCode for InferenceError {
    fn error_code(&self) -> &'static str {
        self.code()
    }
}

impl ErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        self.code()
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        self.code()
    }
}

/// Extension trait for recording an operation's outcome on its span.
pub trait SpanExt {
    /// Marks the span failed with the error's code and message.
    fn record_error<E>(&self, error: &E)
    where
        E: Display + ErrorCode;

    /// `status = "ok"` on success, otherwise the same as [`SpanExt::record_error`].
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: Display + ErrorCode;
}

impl SpanExt for Span {
    fn record_error<E>(&self, error: &E)
    where
        E: Display + ErrorCode,
    {
        self.record("status", "error");
        self.record("error.code", error.error_code());
        self.record("error.message", error.to_string().as_str());
    }

    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: Display + ErrorCode,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => self.record_error(e),
        }
    }
}

/// Factory for per-request spans.
pub struct RequestSpan;

impl RequestSpan {
    /// Span for one boundary request. `model_identity`, `status`,
    /// `error.code`, `error.message` and `latency_ms` are filled in as the
    /// request runs.
    pub fn new(request_id: &str, endpoint: &str) -> Span {
        info_span!(
            "request",
            request_id = %request_id,
            endpoint = %endpoint,
            model_identity = tracing::field::Empty,
            status = tracing::field::Empty,
            error.code = tracing::field::Empty,
            error.message = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    }

    /// Fresh random request id.
    pub fn new_request_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
