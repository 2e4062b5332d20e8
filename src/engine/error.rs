//! Inference error types.
//!
//! All errors are fail-closed: malformed inputs are rejected, never padded
//! or truncated, and no error path yields a default label.

use thiserror::Error;

/// Errors that can occur on the predict path.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Model not loaded: train and register a model, then call /reload")]
    ModelNotReady,

    #[error("Invalid request shape: model expects exactly {expected} features, got {actual}")]
    InvalidRequestShape { expected: usize, actual: usize },

    #[error("Model error: {0}")]
    ModelError(String),
}

impl InferenceError {
    /// Stable machine-readable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelNotReady => "model_not_ready",
            Self::InvalidRequestShape { .. } => "invalid_request_shape",
            Self::ModelError(_) => "model_error",
        }
    }

    /// Returns true if the caller should retry later rather than fix its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ModelNotReady)
    }
}
