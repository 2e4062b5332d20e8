//! Shared fixtures: a scriptable in-process registry client and a fake
//! MLflow tracking server on an ephemeral port.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;

use model_serve::config::EnvConfig;
use model_serve::engine::{Classifier, InferenceError};
use model_serve::models::{
    LoadedModel, ModelArtifact, ModelIdentity, RegistryClient, RegistryConfig, RegistryError,
};
use model_serve::Runtime;

/// Fitted Iris pipeline in the portable artifact format.
pub const IRIS_JSON: &str = r#"{
    "format": "linear-classifier/v1",
    "n_features": 4,
    "classes": [0, 1, 2],
    "scaler": {"mean": [5.8, 3.0, 3.7, 1.2], "scale": [0.8, 0.4, 1.7, 0.7]},
    "coef": [
        [-1.0, 1.2, -1.8, -1.7],
        [0.5, -0.4, -0.2, -0.7],
        [0.5, -0.8, 2.0, 2.4]
    ],
    "intercept": [-0.2, 1.9, -1.7]
}"#;

pub const SETOSA: [f64; 4] = [5.1, 3.5, 1.4, 0.2];
pub const VIRGINICA: [f64; 4] = [6.9, 3.1, 5.4, 2.1];

pub fn iris_classifier() -> Arc<dyn Classifier> {
    let artifact = ModelArtifact::from_bytes(IRIS_JSON.as_bytes()).unwrap();
    Arc::new(artifact.into_classifier().unwrap())
}

/// Returns `label` for any input of the right width.
pub struct ConstantClassifier {
    pub label: i64,
    pub width: usize,
}

impl Classifier for ConstantClassifier {
    fn input_width(&self) -> usize {
        self.width
    }

    fn predict(&self, _features: &[f64]) -> Result<i64, InferenceError> {
        Ok(self.label)
    }
}

/// Identity the fake registry reports for a model predicting `label`.
pub fn labelled_identity(name: &str, stage: &str, label: i64) -> ModelIdentity {
    ModelIdentity::new(format!("models:/{}/{}#{}", name, stage, label))
}

/// Label encoded in an identity from [`labelled_identity`].
pub fn label_of(identity: &ModelIdentity) -> i64 {
    identity
        .as_str()
        .rsplit_once('#')
        .and_then(|(_, l)| l.parse().ok())
        .unwrap()
}

#[derive(Debug, Clone)]
pub enum FakeMode {
    /// Each call serves a fresh constant model labelled by call number.
    Sequential,
    /// Every call serves a constant model with this label.
    Fixed(i64),
    /// Every call serves the real Iris pipeline.
    Iris,
    /// Every call fails with this error.
    Fail(RegistryError),
}

/// In-process registry client with switchable behavior.
pub struct FakeRegistry {
    mode: Mutex<FakeMode>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
    next_label: AtomicI64,
}

impl FakeRegistry {
    pub fn new(mode: FakeMode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
            next_label: AtomicI64::new(1),
        })
    }

    pub fn set_mode(&self, mode: FakeMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn resolve_and_load(&self, name: &str, stage: &str) -> Result<LoadedModel, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = self.mode.lock().unwrap().clone();
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let constant = |label: i64| LoadedModel {
            identity: labelled_identity(name, stage, label),
            version: Some(label.to_string()),
            classifier: Arc::new(ConstantClassifier { label, width: 4 }),
        };

        match mode {
            FakeMode::Sequential => Ok(constant(self.next_label.fetch_add(1, Ordering::SeqCst))),
            FakeMode::Fixed(label) => Ok(constant(label)),
            FakeMode::Iris => Ok(LoadedModel {
                identity: ModelIdentity::from_name_stage(name, stage),
                version: Some("1".to_string()),
                classifier: iris_classifier(),
            }),
            FakeMode::Fail(err) => Err(err),
        }
    }
}

pub fn unavailable() -> RegistryError {
    RegistryError::RegistryUnavailable("connection refused".to_string())
}

pub fn runtime_with(registry: Arc<FakeRegistry>) -> Runtime {
    Runtime::with_registry(EnvConfig::default(), registry).unwrap()
}

// ============================================================================
// Fake MLflow tracking server
// ============================================================================

/// What the fake tracking server answers with.
#[derive(Debug, Clone)]
pub struct MlflowFixture {
    pub model_name: String,
    pub stage: String,
    pub versions: Vec<String>,
    /// `artifact_uri` returned by get-download-uri. `None` means a proxied
    /// URI under the server's own artifact store.
    pub artifact_uri: Option<String>,
    pub artifact: String,
    pub fail_with_500: bool,
    /// Forced status and MLflow `error_code` for get-latest-versions.
    pub reject_lookup: Option<(StatusCode, &'static str)>,
}

impl Default for MlflowFixture {
    fn default() -> Self {
        Self {
            model_name: "IrisClassifier".to_string(),
            stage: "Production".to_string(),
            versions: vec!["1".to_string(), "3".to_string()],
            artifact_uri: None,
            artifact: IRIS_JSON.to_string(),
            fail_with_500: false,
            reject_lookup: None,
        }
    }
}

pub const PROXIED_ARTIFACT_URI: &str = "mlflow-artifacts:/7/run42/artifacts/model";

#[derive(Deserialize)]
struct LatestVersionsRequest {
    name: String,
    #[serde(default)]
    stages: Vec<String>,
}

#[derive(Deserialize)]
struct DownloadUriQuery {
    name: String,
    version: String,
}

type Fixture = Arc<Mutex<MlflowFixture>>;

fn mlflow_error(status: StatusCode, code: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error_code": code, "message": code })),
    )
        .into_response()
}

async fn latest_versions(
    State(fx): State<Fixture>,
    Json(req): Json<LatestVersionsRequest>,
) -> Response {
    let fx = fx.lock().unwrap().clone();
    if fx.fail_with_500 {
        return mlflow_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR");
    }
    if let Some((status, code)) = fx.reject_lookup {
        return mlflow_error(status, code);
    }
    if req.name != fx.model_name {
        return mlflow_error(StatusCode::NOT_FOUND, "RESOURCE_DOES_NOT_EXIST");
    }
    let versions: Vec<_> = if req.stages.contains(&fx.stage) {
        fx.versions
            .iter()
            .map(|v| serde_json::json!({ "name": fx.model_name, "version": v, "current_stage": fx.stage }))
            .collect()
    } else {
        Vec::new()
    };
    Json(serde_json::json!({ "model_versions": versions })).into_response()
}

async fn download_uri(State(fx): State<Fixture>, Query(q): Query<DownloadUriQuery>) -> Response {
    let fx = fx.lock().unwrap().clone();
    if q.name != fx.model_name || !fx.versions.contains(&q.version) {
        return mlflow_error(StatusCode::NOT_FOUND, "RESOURCE_DOES_NOT_EXIST");
    }
    let uri = fx
        .artifact_uri
        .unwrap_or_else(|| format!("{}-v{}", PROXIED_ARTIFACT_URI, q.version));
    Json(serde_json::json!({ "artifact_uri": uri })).into_response()
}

async fn artifact(State(fx): State<Fixture>, Path(path): Path<String>) -> Response {
    let fx = fx.lock().unwrap().clone();
    let latest = fx
        .versions
        .iter()
        .max_by_key(|v| v.parse::<u64>().unwrap_or(0))
        .cloned()
        .unwrap_or_default();
    let expected = format!("7/run42/artifacts/model-v{}/model.json", latest);
    if path == expected {
        fx.artifact.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// A running fake tracking server. The fixture can be changed between
/// requests.
pub struct FakeMlflow {
    pub addr: SocketAddr,
    pub fixture: Fixture,
}

impl FakeMlflow {
    pub async fn start(fixture: MlflowFixture) -> Self {
        let fixture = Arc::new(Mutex::new(fixture));
        let app = Router::new()
            .route(
                "/api/2.0/mlflow/registered-models/get-latest-versions",
                post(latest_versions),
            )
            .route("/api/2.0/mlflow/model-versions/get-download-uri", get(download_uri))
            .route("/api/2.0/mlflow-artifacts/artifacts/*path", get(artifact))
            .with_state(fixture.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, fixture }
    }

    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            tracking_uri: self.uri(),
            timeout: Duration::from_secs(5),
            artifact_sha256: None,
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut MlflowFixture)) {
        f(&mut self.fixture.lock().unwrap());
    }
}

/// A tracking URI nothing listens on.
pub async fn dead_tracking_uri() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
