//! Health reporting: the `/health` document plus liveness and readiness
//! probes for orchestrators.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ModelIdentity, ModelSlot};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Always `"ok"`: the process is up even without a model.
    pub status: String,
    pub model_loaded: bool,
    pub model_identity: Option<ModelIdentity>,
    pub model_version: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub ready: bool,
    pub uptime_secs: u64,
}

/// Reads the model slot to answer health queries.
pub struct HealthChecker {
    slot: Arc<ModelSlot>,
    start_time: Instant,
}

impl HealthChecker {
    pub fn new(slot: Arc<ModelSlot>) -> Self {
        Self {
            slot,
            start_time: Instant::now(),
        }
    }

    /// Liveness: the process is responsive.
    pub fn is_alive(&self) -> bool {
        true
    }

    /// Readiness: a model is loaded and the server is not draining.
    pub fn is_ready(&self, draining: bool) -> bool {
        !draining && self.slot.is_loaded()
    }

    /// Full health document from a single slot snapshot.
    pub fn report(&self, draining: bool) -> HealthReport {
        let active = self.slot.snapshot();
        HealthReport {
            status: "ok".to_string(),
            model_loaded: active.is_some(),
            model_identity: active.as_ref().map(|m| m.identity().clone()),
            model_version: active.as_ref().and_then(|m| m.model.version.clone()),
            loaded_at: active.as_ref().map(|m| m.loaded_at),
            ready: !draining && active.is_some(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}
