//! HTTP boundary: routes, shared state and the serve loop.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /health` | health document (counted) |
//! | `GET /health/live` | liveness probe |
//! | `GET /health/ready` | readiness probe |
//! | `POST /reload` | on-demand model reload |
//! | `POST /predict` | inference |
//! | `GET /metrics` | Prometheus text |

mod handlers;
pub mod protocol;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::InferenceHandler;
use crate::health::HealthChecker;
use crate::models::LifecycleManager;
use crate::telemetry::MetricsRecorder;

pub use protocol::{
    ApiError, ErrorBody, PredictRequest, PredictResponse, ProbeResponse, ReloadResponse,
};

/// Components shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<LifecycleManager>,
    pub inference: Arc<InferenceHandler>,
    pub health: Arc<HealthChecker>,
    pub metrics: Arc<MetricsRecorder>,
    /// Cancelled when the server starts draining.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn is_draining(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/health/live", get(handlers::live))
        .route("/health/ready", get(handlers::ready))
        .route("/reload", post(handlers::reload))
        .route("/predict", post(handlers::predict))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}

/// Serve until `state.shutdown` is cancelled, then drain open connections.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "http server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
