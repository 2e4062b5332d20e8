//! Runtime configuration loading from environment variables.
//!
//! Missing or invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `MLFLOW_TRACKING_URI` | `http://localhost:5000` | Model registry endpoint |
//! | `MODEL_NAME` | `IrisClassifier` | Registered model name |
//! | `MODEL_STAGE` | `Production` | Stage to serve |
//! | `MODEL_ARTIFACT_SHA256` | unset | Pin the artifact digest |
//! | `SERVE_BIND_ADDR` | `0.0.0.0:8000` | HTTP listen address |
//! | `SERVE_REGISTRY_TIMEOUT` | 10 | Registry request timeout (secs) |
//! | `SERVE_SHUTDOWN_TIMEOUT` | 30 | Graceful shutdown timeout (secs) |
//! | `SERVE_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `RUST_LOG` | `info` | Log filter |

use std::net::SocketAddr;
use std::time::Duration;

use crate::models::{ModelTarget, RegistryConfig};
use crate::telemetry::{LogConfig, LogFormat};

pub const DEFAULT_TRACKING_URI: &str = "http://localhost:5000";
pub const DEFAULT_MODEL_NAME: &str = "IrisClassifier";
pub const DEFAULT_MODEL_STAGE: &str = "Production";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Flat, printable summary of the effective configuration.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub tracking_uri: String,
    pub model_name: String,
    pub model_stage: String,
    pub artifact_sha256_pinned: bool,
    pub bind_addr: String,
    pub registry_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
    pub log_format: String,
    pub log_level: String,
}

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub registry: RegistryConfig,
    pub target: ModelTarget,
    pub bind_addr: SocketAddr,
    pub shutdown_timeout: Duration,
    pub log: LogConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            target: ModelTarget::default(),
            bind_addr: default_bind_addr(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            log: LogConfig::default(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

/// Non-empty trimmed env var, or `default`.
fn parse_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn load_registry_config() -> RegistryConfig {
    let tracking_uri = parse_string("MLFLOW_TRACKING_URI", DEFAULT_TRACKING_URI);
    let timeout_secs = parse_u64("SERVE_REGISTRY_TIMEOUT", DEFAULT_REGISTRY_TIMEOUT_SECS).max(1);
    let artifact_sha256 = std::env::var("MODEL_ARTIFACT_SHA256")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    RegistryConfig {
        tracking_uri,
        timeout: Duration::from_secs(timeout_secs),
        artifact_sha256,
    }
}

fn load_log_config() -> LogConfig {
    let format = std::env::var("SERVE_LOG_FORMAT")
        .ok()
        .and_then(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    LogConfig {
        format,
        level: parse_string("RUST_LOG", "info"),
        output_path: None,
    }
}

/// Load all configuration from environment variables.
pub fn load() -> EnvConfig {
    let bind_addr = parse_string("SERVE_BIND_ADDR", DEFAULT_BIND_ADDR)
        .parse::<SocketAddr>()
        .unwrap_or_else(|_| default_bind_addr());
    let shutdown_secs = parse_u64("SERVE_SHUTDOWN_TIMEOUT", DEFAULT_SHUTDOWN_TIMEOUT_SECS).max(1);

    EnvConfig {
        registry: load_registry_config(),
        target: ModelTarget {
            name: parse_string("MODEL_NAME", DEFAULT_MODEL_NAME),
            stage: parse_string("MODEL_STAGE", DEFAULT_MODEL_STAGE),
        },
        bind_addr,
        shutdown_timeout: Duration::from_secs(shutdown_secs),
        log: load_log_config(),
    }
}

impl EnvConfig {
    /// Return a printable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            tracking_uri: self.registry.tracking_uri.clone(),
            model_name: self.target.name.clone(),
            model_stage: self.target.stage.clone(),
            artifact_sha256_pinned: self.registry.artifact_sha256.is_some(),
            bind_addr: self.bind_addr.to_string(),
            registry_timeout_secs: self.registry.timeout.as_secs(),
            shutdown_timeout_secs: self.shutdown_timeout.as_secs(),
            log_format: self.log.format.as_str().to_string(),
            log_level: self.log.level.clone(),
        }
    }
}
