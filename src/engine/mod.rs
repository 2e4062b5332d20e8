//! Inference: the classifier capability and the predict path.

mod classifier;
pub mod error;
mod handler;

pub use classifier::{Classifier, LinearClassifier, Standardizer};
pub use error::InferenceError;
pub use handler::{InferenceHandler, PredictionResult, IRIS_FEATURE_COUNT};
