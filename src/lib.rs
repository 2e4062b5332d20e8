//! model-serve runtime
//!
//! Serves predictions from a registry-managed classification model over HTTP,
//! swaps the model at runtime without a restart, and exports Prometheus
//! metrics.
//!
//! # Components
//!
//! - **Registry client** (`models::MlflowRegistry`): resolves `(name, stage)`
//!   to an artifact and builds a classifier from it.
//! - **Model slot** (`models::ModelSlot`): the single active model, replaced
//!   whole in one atomic swap.
//! - **Lifecycle manager** (`models::LifecycleManager`): load at startup
//!   (failures logged, process stays up) and on demand (failures returned).
//! - **Inference handler** (`engine::InferenceHandler`): shape checks and
//!   prediction against one slot snapshot.
//! - **Metrics recorder** (`telemetry::MetricsRecorder`): per-endpoint counts
//!   and latency histograms.

pub mod cli;
pub mod config;
pub mod engine;
pub mod health;
pub mod http;
pub mod models;
pub mod telemetry;

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use config::EnvConfig;
use engine::InferenceHandler;
use health::HealthChecker;
use http::AppState;
use models::{LifecycleManager, LoadOutcome, MlflowRegistry, ModelSlot, RegistryClient, RegistryError};
use telemetry::{MetricsError, MetricsRecorder};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Metrics setup failed: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Registry client setup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server task failed: {0}")]
    Task(String),
}

/// A fully wired service instance.
pub struct Runtime {
    pub config: EnvConfig,
    pub slot: Arc<ModelSlot>,
    pub metrics: Arc<MetricsRecorder>,
    pub lifecycle: Arc<LifecycleManager>,
    pub inference: Arc<InferenceHandler>,
    pub health: Arc<HealthChecker>,
    pub shutdown: CancellationToken,
}

impl Runtime {
    /// Wire a runtime backed by the MLflow registry named in `config`.
    pub fn new(config: EnvConfig) -> Result<Self, ServeError> {
        let registry = MlflowRegistry::new(config.registry.clone())?;
        Self::with_registry(config, Arc::new(registry))
    }

    /// Wire a runtime around any registry client.
    pub fn with_registry(
        config: EnvConfig,
        registry: Arc<dyn RegistryClient>,
    ) -> Result<Self, ServeError> {
        let slot = Arc::new(ModelSlot::new());
        let metrics = Arc::new(MetricsRecorder::new()?);
        let lifecycle = Arc::new(LifecycleManager::new(
            registry,
            slot.clone(),
            metrics.clone(),
            config.target.clone(),
        ));
        let inference = Arc::new(InferenceHandler::new(slot.clone(), metrics.clone()));
        let health = Arc::new(HealthChecker::new(slot.clone()));

        Ok(Self {
            config,
            slot,
            metrics,
            lifecycle,
            inference,
            health,
            shutdown: CancellationToken::new(),
        })
    }

    /// Shared handler state for the HTTP router.
    pub fn app_state(&self) -> AppState {
        AppState {
            lifecycle: self.lifecycle.clone(),
            inference: self.inference.clone(),
            health: self.health.clone(),
            metrics: self.metrics.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Startup load attempt. Never fails; see [`LoadOutcome`].
    pub async fn start(&self) -> LoadOutcome {
        self.lifecycle.load_at_startup().await
    }

    /// Load at startup, then serve on `listener` until [`Runtime::shutdown`]
    /// is cancelled. Open connections get `shutdown_timeout` to finish.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<(), ServeError> {
        let outcome = self.start().await;
        info!(model_loaded = outcome.is_loaded(), "startup load finished");

        let mut server = tokio::spawn(http::serve(listener, self.app_state()));

        tokio::select! {
            res = &mut server => return flatten(res),
            _ = self.shutdown.cancelled() => {}
        }

        info!(timeout_secs = self.config.shutdown_timeout.as_secs(), "draining connections");
        match tokio::time::timeout(self.config.shutdown_timeout, server).await {
            Ok(res) => flatten(res),
            Err(_) => {
                warn!("shutdown timeout elapsed, abandoning open connections");
                Ok(())
            }
        }
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), ServeError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;

        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("shutdown signal received");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "cannot listen for shutdown signal"),
            }
        });

        self.serve_on(listener).await
    }
}

fn flatten(
    res: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), ServeError> {
    match res {
        Ok(inner) => inner.map_err(ServeError::from),
        Err(e) => Err(ServeError::Task(e.to_string())),
    }
}
