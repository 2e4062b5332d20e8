//! Portable model artifact parsing and validation.
//!
//! The training job exports its fitted scaler + linear classifier pipeline as
//! `model.json` next to the registered model. Artifacts are validated fully
//! before a classifier is built from them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::registry::RegistryError;
use crate::engine::{LinearClassifier, Standardizer, IRIS_FEATURE_COUNT};

/// Format tag accepted by this runtime.
pub const ARTIFACT_FORMAT: &str = "linear-classifier/v1";

/// File name of the artifact inside the model's artifact directory.
pub const ARTIFACT_FILE: &str = "model.json";

/// Fitted `StandardScaler` parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Contents of `model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Format tag, must equal [`ARTIFACT_FORMAT`].
    pub format: String,
    /// Expected input width.
    pub n_features: usize,
    /// Class labels in decision-function order.
    pub classes: Vec<i64>,
    #[serde(default)]
    pub scaler: Option<ScalerParams>,
    /// One row per class (or a single row for binary models).
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl ModelArtifact {
    /// Parse an artifact from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        serde_json::from_slice(bytes)
            .map_err(|e| RegistryError::InvalidArtifact(format!("invalid artifact JSON: {}", e)))
    }

    /// Validate dimensions and tags.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let invalid = |msg: String| Err(RegistryError::InvalidArtifact(msg));

        if self.format != ARTIFACT_FORMAT {
            return invalid(format!(
                "unsupported artifact format '{}', expected '{}'",
                self.format, ARTIFACT_FORMAT
            ));
        }
        if self.n_features != IRIS_FEATURE_COUNT {
            return invalid(format!(
                "n_features is {}, this service serves {}-feature models",
                self.n_features, IRIS_FEATURE_COUNT
            ));
        }
        if self.coef.is_empty() {
            return invalid("coef cannot be empty".into());
        }
        if let Some(row) = self.coef.iter().find(|r| r.len() != self.n_features) {
            return invalid(format!(
                "coef row has {} weights, expected {}",
                row.len(),
                self.n_features
            ));
        }
        if self.intercept.len() != self.coef.len() {
            return invalid(format!(
                "intercept has {} entries, expected {}",
                self.intercept.len(),
                self.coef.len()
            ));
        }

        let expected_classes = if self.coef.len() == 1 { 2 } else { self.coef.len() };
        if self.classes.len() != expected_classes {
            return invalid(format!(
                "classes has {} labels, expected {}",
                self.classes.len(),
                expected_classes
            ));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != self.n_features || scaler.scale.len() != self.n_features {
                return invalid("scaler mean/scale length must equal n_features".into());
            }
        }

        let weights = self.coef.iter().flatten().chain(&self.intercept);
        if weights.clone().any(|w| !w.is_finite()) {
            return invalid("coef and intercept must be finite".into());
        }
        Ok(())
    }

    /// Validate and build the classifier.
    pub fn into_classifier(self) -> Result<LinearClassifier, RegistryError> {
        self.validate()?;
        let scaler = self.scaler.map(|s| Standardizer { mean: s.mean, scale: s.scale });
        Ok(LinearClassifier::from_parts(
            self.n_features,
            self.classes,
            scaler,
            self.coef,
            self.intercept,
        ))
    }
}

/// Check artifact bytes against an expected hex SHA-256 digest.
pub fn verify_sha256(bytes: &[u8], expected: &str) -> Result<(), RegistryError> {
    let actual = hex::encode(Sha256::digest(bytes));
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(RegistryError::InvalidArtifact(format!(
            "hash mismatch: expected {}, got {}",
            expected, actual
        )))
    }
}
