//! The predict path: validate, read the slot once, invoke, respond.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::error::InferenceError;
use crate::models::{ModelIdentity, ModelSlot};
use crate::telemetry::{endpoint, MetricsRecorder};

/// Width every predict request must have, whatever model is loaded.
pub const IRIS_FEATURE_COUNT: usize = 4;

/// A successful prediction, tagged with the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: i64,
    pub model_identity: ModelIdentity,
    /// Slot generation of the model that produced `label`.
    pub generation: u64,
}

/// Runs predictions against whatever model is active at call time.
pub struct InferenceHandler {
    slot: Arc<ModelSlot>,
    metrics: Arc<MetricsRecorder>,
}

impl InferenceHandler {
    pub fn new(slot: Arc<ModelSlot>, metrics: Arc<MetricsRecorder>) -> Self {
        Self { slot, metrics }
    }

    /// Predict a class label for `features`.
    ///
    /// Every call, successful or not, counts once toward the predict endpoint
    /// and contributes one latency observation.
    pub fn predict(&self, features: &[f64]) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();
        self.metrics.increment(endpoint::PREDICT);

        let result = self.run(features);

        self.metrics
            .observe_latency(endpoint::PREDICT, start.elapsed().as_secs_f64());
        result
    }

    fn run(&self, features: &[f64]) -> Result<PredictionResult, InferenceError> {
        // One snapshot for the whole request: classifier and identity can't
        // come from different loads even if a reload lands mid-request.
        let active = self.slot.snapshot().ok_or(InferenceError::ModelNotReady)?;
        let classifier = active.classifier();

        if features.len() != IRIS_FEATURE_COUNT {
            return Err(InferenceError::InvalidRequestShape {
                expected: IRIS_FEATURE_COUNT,
                actual: features.len(),
            });
        }
        if classifier.input_width() != IRIS_FEATURE_COUNT {
            return Err(InferenceError::ModelError(format!(
                "active model takes {} features, requests carry {}",
                classifier.input_width(),
                IRIS_FEATURE_COUNT
            )));
        }

        let label = classifier.predict(features)?;
        Ok(PredictionResult {
            label,
            model_identity: active.identity().clone(),
            generation: active.generation,
        })
    }
}
