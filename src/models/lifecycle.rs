//! Model (re)load orchestration.
//!
//! Calls the registry client and publishes the result into the model slot in
//! one swap. A failed load leaves the slot exactly as it was. Concurrent
//! reloads are independent: each goes to the registry and the last swap wins.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::registry::{RegistryClient, RegistryError};
use super::slot::{ModelIdentity, ModelSlot};
use crate::telemetry::MetricsRecorder;

/// Which registered model to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTarget {
    pub name: String,
    pub stage: String,
}

impl Default for ModelTarget {
    fn default() -> Self {
        Self {
            name: "IrisClassifier".to_string(),
            stage: "Production".to_string(),
        }
    }
}

/// Result of the startup load attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(ModelIdentity),
    /// The service keeps running without a model until a reload succeeds.
    NotReady(RegistryError),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Orchestrates loading through the registry client into the slot.
pub struct LifecycleManager {
    registry: Arc<dyn RegistryClient>,
    slot: Arc<ModelSlot>,
    metrics: Arc<MetricsRecorder>,
    target: ModelTarget,
}

impl LifecycleManager {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        slot: Arc<ModelSlot>,
        metrics: Arc<MetricsRecorder>,
        target: ModelTarget,
    ) -> Self {
        Self { registry, slot, metrics, target }
    }

    pub fn target(&self) -> &ModelTarget {
        &self.target
    }

    /// Load the configured model and publish it. Always queries the registry.
    pub async fn load_or_reload(&self) -> Result<ModelIdentity, RegistryError> {
        let start = Instant::now();
        let result = self
            .registry
            .resolve_and_load(&self.target.name, &self.target.stage)
            .await;

        match result {
            Ok(model) => {
                let version = model.version.clone();
                let active = self.slot.publish(model);
                self.metrics.record_load(true);
                self.metrics.set_model_loaded(true);
                info!(
                    model_identity = %active.identity(),
                    version = ?version,
                    generation = active.generation,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "model published"
                );
                Ok(active.identity().clone())
            }
            Err(e) => {
                self.metrics.record_load(false);
                warn!(
                    name = %self.target.name,
                    stage = %self.target.stage,
                    error = %e,
                    kept = ?self.slot.identity(),
                    "model load failed, slot unchanged"
                );
                Err(e)
            }
        }
    }

    /// Startup variant: never fails the caller, reports what happened instead.
    pub async fn load_at_startup(&self) -> LoadOutcome {
        match self.load_or_reload().await {
            Ok(identity) => LoadOutcome::Loaded(identity),
            Err(e) => {
                debug!(code = e.code(), "starting without a model; POST /reload once one is registered");
                LoadOutcome::NotReady(e)
            }
        }
    }
}
