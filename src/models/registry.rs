//! Model registry client.
//!
//! Resolves a (name, stage) pair to a concrete artifact and materializes a
//! ready-to-invoke classifier from it. Holds no state beyond its HTTP client
//! and never touches the model slot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::artifact::{verify_sha256, ModelArtifact, ARTIFACT_FILE};
use super::slot::{LoadedModel, ModelIdentity};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Model registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Model not found in registry: {name} (stage {stage})")]
    ModelNotFound { name: String, stage: String },

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
}

impl RegistryError {
    /// Stable machine-readable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RegistryUnavailable(_) => "registry_unavailable",
            Self::ModelNotFound { .. } => "model_not_found",
            Self::InvalidArtifact(_) => "invalid_artifact",
        }
    }
}

/// Resolves and loads registered models.
///
/// Each call goes to the registry; implementations do not cache or retry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn resolve_and_load(&self, name: &str, stage: &str) -> Result<LoadedModel, RegistryError>;
}

/// Connection settings for [`MlflowRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub tracking_uri: String,
    pub timeout: Duration,
    /// Expected hex SHA-256 of `model.json`, if pinned.
    pub artifact_sha256: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tracking_uri: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(10),
            artifact_sha256: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestVersionsResponse {
    #[serde(default)]
    model_versions: Vec<ModelVersion>,
}

#[derive(Debug, Deserialize)]
struct ModelVersion {
    version: String,
}

#[derive(Debug, Deserialize)]
struct DownloadUriResponse {
    artifact_uri: String,
}

/// MLflow error code for a missing registered model or version.
const RESOURCE_DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";

#[derive(Debug, Deserialize)]
struct MlflowErrorBody {
    #[serde(default)]
    error_code: Option<String>,
}

/// Where the artifact bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    Http(String),
    File(PathBuf),
}

/// Map an MLflow artifact URI to the location of `model.json`.
pub fn artifact_location(
    tracking_uri: &str,
    artifact_uri: &str,
) -> Result<ArtifactLocation, RegistryError> {
    let tracking = tracking_uri.trim_end_matches('/');
    let uri = artifact_uri.trim_end_matches('/');

    if let Some(rest) = uri.strip_prefix("mlflow-artifacts:") {
        // Either mlflow-artifacts:/path or mlflow-artifacts://host/path; the
        // proxy endpoint only needs the path.
        let path = match rest.strip_prefix("//") {
            Some(with_host) => with_host.split_once('/').map(|(_, p)| p).unwrap_or(""),
            None => rest.trim_start_matches('/'),
        };
        return Ok(ArtifactLocation::Http(format!(
            "{}/api/2.0/mlflow-artifacts/artifacts/{}/{}",
            tracking, path, ARTIFACT_FILE
        )));
    }
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(ArtifactLocation::Http(format!("{}/{}", uri, ARTIFACT_FILE)));
    }
    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(ArtifactLocation::File(PathBuf::from(path).join(ARTIFACT_FILE)));
    }
    if uri.starts_with('/') {
        return Ok(ArtifactLocation::File(PathBuf::from(uri).join(ARTIFACT_FILE)));
    }

    Err(RegistryError::InvalidArtifact(format!(
        "unsupported artifact URI scheme: {}",
        artifact_uri
    )))
}

fn unavailable(e: reqwest::Error) -> RegistryError {
    RegistryError::RegistryUnavailable(e.to_string())
}

/// Registry client backed by the MLflow tracking server REST API.
pub struct MlflowRegistry {
    http: reqwest::Client,
    config: RegistryConfig,
}

impl MlflowRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(unavailable)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/2.0/mlflow/{}", self.config.tracking_uri.trim_end_matches('/'), path)
    }

    async fn latest_version(&self, name: &str, stage: &str) -> Result<String, RegistryError> {
        let not_found = || RegistryError::ModelNotFound {
            name: name.to_string(),
            stage: stage.to_string(),
        };

        let response = self
            .http
            .post(self.api("registered-models/get-latest-versions"))
            .json(&serde_json::json!({ "name": name, "stages": [stage] }))
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RegistryError::RegistryUnavailable(format!(
                "registry returned {}",
                status
            )));
        }
        if !status.is_success() {
            let body: Option<MlflowErrorBody> = response.json().await.ok();
            let error_code = body.and_then(|b| b.error_code);
            debug!(%status, error_code = ?error_code, "registry rejected version lookup");
            if status == StatusCode::NOT_FOUND
                || error_code.as_deref() == Some(RESOURCE_DOES_NOT_EXIST)
            {
                return Err(not_found());
            }
            return Err(RegistryError::RegistryUnavailable(format!(
                "version lookup returned {}{}",
                status,
                error_code.map(|c| format!(" ({})", c)).unwrap_or_default()
            )));
        }

        let body: LatestVersionsResponse = response.json().await.map_err(unavailable)?;
        body.model_versions
            .into_iter()
            .max_by_key(|v| v.version.parse::<u64>().unwrap_or(0))
            .map(|v| v.version)
            .ok_or_else(not_found)
    }

    async fn download_uri(&self, name: &str, version: &str) -> Result<String, RegistryError> {
        let response = self
            .http
            .get(self.api("model-versions/get-download-uri"))
            .query(&[("name", name), ("version", version)])
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RegistryError::RegistryUnavailable(format!(
                "registry returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(RegistryError::InvalidArtifact(format!(
                "no download URI for {} version {} ({})",
                name, version, status
            )));
        }

        let body: DownloadUriResponse = response.json().await.map_err(unavailable)?;
        Ok(body.artifact_uri)
    }

    async fn fetch_artifact(&self, location: &ArtifactLocation) -> Result<Vec<u8>, RegistryError> {
        match location {
            ArtifactLocation::Http(url) => {
                let response = self.http.get(url).send().await.map_err(unavailable)?;
                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    return Err(RegistryError::InvalidArtifact(format!(
                        "{} missing at {}",
                        ARTIFACT_FILE, url
                    )));
                }
                if !status.is_success() {
                    return Err(RegistryError::RegistryUnavailable(format!(
                        "artifact fetch returned {}",
                        status
                    )));
                }
                let bytes = response.bytes().await.map_err(unavailable)?;
                Ok(bytes.to_vec())
            }
            ArtifactLocation::File(path) => tokio::fs::read(path).await.map_err(|e| {
                RegistryError::InvalidArtifact(format!("cannot read {}: {}", path.display(), e))
            }),
        }
    }
}

#[async_trait]
impl RegistryClient for MlflowRegistry {
    async fn resolve_and_load(&self, name: &str, stage: &str) -> Result<LoadedModel, RegistryError> {
        let version = self.latest_version(name, stage).await?;
        let artifact_uri = self.download_uri(name, &version).await?;
        let location = artifact_location(&self.config.tracking_uri, &artifact_uri)?;
        debug!(name, stage, %version, ?location, "resolved model artifact");

        let bytes = self.fetch_artifact(&location).await?;
        if let Some(expected) = &self.config.artifact_sha256 {
            verify_sha256(&bytes, expected)?;
        }
        let classifier = ModelArtifact::from_bytes(&bytes)?.into_classifier()?;

        Ok(LoadedModel {
            identity: ModelIdentity::from_name_stage(name, stage),
            version: Some(version),
            classifier: Arc::new(classifier),
        })
    }
}
