//! Minimal HTTP client for CLI subcommands.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::health::HealthReport;
use crate::http::{ErrorBody, PredictRequest, PredictResponse, ReloadResponse};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Talks to a running server at `base_url`.
pub struct CliHttpClient {
    base_url: String,
    http: reqwest::Client,
}

impl CliHttpClient {
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthReport, CliError> {
        self.get_json("/health").await
    }

    /// Probe status: `Ok(true)` on 200, `Ok(false)` on 503.
    pub async fn probe(&self, path: &str) -> Result<bool, CliError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| CliError::Connection(e.to_string()))?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::SERVICE_UNAVAILABLE => Ok(false),
            status => Err(server_error(status, response).await),
        }
    }

    pub async fn reload(&self) -> Result<ReloadResponse, CliError> {
        let response = self
            .http
            .post(self.url("/reload"))
            .send()
            .await
            .map_err(|e| CliError::Connection(e.to_string()))?;
        decode(response).await
    }

    pub async fn predict(&self, features: Vec<f64>) -> Result<PredictResponse, CliError> {
        let response = self
            .http
            .post(self.url("/predict"))
            .json(&PredictRequest { features })
            .send()
            .await
            .map_err(|e| CliError::Connection(e.to_string()))?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| CliError::Connection(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CliError> {
    let status = response.status();
    if !status.is_success() {
        return Err(server_error(status, response).await);
    }
    response.json().await.map_err(|e| CliError::Decode(e.to_string()))
}

async fn server_error(status: StatusCode, response: reqwest::Response) -> CliError {
    let text = response.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(err) => format!("{} ({})", err.detail, err.error),
        Err(_) => text,
    };
    CliError::Server { status: status.as_u16(), body }
}
