//! The process-wide holder of the currently active model.
//!
//! Readers take a snapshot `Arc` without locking; writers publish a complete
//! `ActiveModel` in one pointer swap. The classifier and its identity live in
//! the same immutable record, so no reader can pair one load's classifier
//! with another load's identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::Classifier;

/// Identity of a loaded artifact, e.g. `models:/IrisClassifier/Production`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelIdentity(String);

impl ModelIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Canonical registry URI for a name/stage pair.
    pub fn from_name_stage(name: &str, stage: &str) -> Self {
        Self(format!("models:/{}/{}", name, stage))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A model as produced by the registry client, before publication.
#[derive(Clone)]
pub struct LoadedModel {
    pub identity: ModelIdentity,
    /// Registry version number, when the registry reports one.
    pub version: Option<String>,
    pub classifier: Arc<dyn Classifier>,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("identity", &self.identity)
            .field("version", &self.version)
            .field("input_width", &self.classifier.input_width())
            .finish()
    }
}

/// Immutable snapshot stored in the slot.
#[derive(Debug)]
pub struct ActiveModel {
    pub model: LoadedModel,
    /// Publish sequence number, unique per successful load.
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
}

impl ActiveModel {
    pub fn identity(&self) -> &ModelIdentity {
        &self.model.identity
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.model.classifier.as_ref()
    }
}

/// Empty until the first successful load; replaced whole on every reload.
pub struct ModelSlot {
    current: ArcSwapOption<ActiveModel>,
    publishes: AtomicU64,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::const_empty(),
            publishes: AtomicU64::new(0),
        }
    }

    /// Current snapshot, or `None` if nothing has been loaded yet.
    pub fn snapshot(&self) -> Option<Arc<ActiveModel>> {
        self.current.load_full()
    }

    /// Atomically replace the slot contents and return the new snapshot.
    pub fn publish(&self, model: LoadedModel) -> Arc<ActiveModel> {
        let generation = self.publishes.fetch_add(1, Ordering::SeqCst) + 1;
        let next = Arc::new(ActiveModel {
            model,
            generation,
            loaded_at: Utc::now(),
        });
        self.current.store(Some(next.clone()));
        next
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Identity of the active model, if any.
    pub fn identity(&self) -> Option<ModelIdentity> {
        self.snapshot().map(|m| m.identity().clone())
    }
}

impl Default for ModelSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InferenceError;

    struct Constant(i64);

    impl Classifier for Constant {
        fn input_width(&self) -> usize {
            4
        }

        fn predict(&self, _features: &[f64]) -> Result<i64, InferenceError> {
            Ok(self.0)
        }
    }

    fn loaded(identity: &str, label: i64) -> LoadedModel {
        LoadedModel {
            identity: ModelIdentity::new(identity),
            version: None,
            classifier: Arc::new(Constant(label)),
        }
    }

    #[test]
    fn test_starts_empty() {
        let slot = ModelSlot::new();
        assert!(!slot.is_loaded());
        assert!(slot.identity().is_none());
        assert!(slot.snapshot().is_none());
    }

    #[test]
    fn test_publish_replaces_whole_record() {
        let slot = ModelSlot::new();
        slot.publish(loaded("models:/a/Staging", 1));
        let first = slot.snapshot().unwrap();

        slot.publish(loaded("models:/a/Production", 2));
        let second = slot.snapshot().unwrap();

        assert_eq!(first.identity().as_str(), "models:/a/Staging");
        assert_eq!(first.classifier().predict(&[0.0; 4]).unwrap(), 1);
        assert_eq!(second.identity().as_str(), "models:/a/Production");
        assert_eq!(second.classifier().predict(&[0.0; 4]).unwrap(), 2);
        assert_eq!(second.generation, first.generation + 1);
    }

    #[test]
    fn test_identity_from_name_stage() {
        let id = ModelIdentity::from_name_stage("IrisClassifier", "Production");
        assert_eq!(id.to_string(), "models:/IrisClassifier/Production");
    }
}
