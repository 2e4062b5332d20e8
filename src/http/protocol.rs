//! Wire types for the HTTP surface and the error-to-status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{InferenceError, PredictionResult};
use crate::models::{ModelIdentity, RegistryError};

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

/// Successful `POST /predict` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub model_identity: ModelIdentity,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            prediction: result.label,
            model_identity: result.model_identity,
        }
    }
}

/// Successful `POST /reload` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub reloaded: bool,
    pub model_identity: Option<ModelIdentity>,
}

/// Probe response for `/health/live` and `/health/ready`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub ok: bool,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `model_not_ready`.
    pub error: String,
    /// Human-readable detail naming the failed precondition.
    pub detail: String,
}

/// Anything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Inference(InferenceError::ModelNotReady) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Inference(InferenceError::InvalidRequestShape { .. }) => StatusCode::BAD_REQUEST,
            Self::Inference(InferenceError::ModelError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Registry(RegistryError::RegistryUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Registry(RegistryError::ModelNotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Registry(RegistryError::InvalidArtifact(_)) => StatusCode::BAD_GATEWAY,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Inference(e) => e.code(),
            Self::Registry(e) => e.code(),
            Self::InvalidBody(_) => "invalid_body",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code().to_string(),
            detail: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
