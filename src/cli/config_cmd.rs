//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables
//! without contacting a running server.

use crate::config::{self, EffectiveConfig};

/// MLflow stages a registered model version can sit in.
const KNOWN_STAGES: &[&str] = &["None", "Staging", "Production", "Archived"];

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print_config(&cfg);
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    let cfg = config::EnvConfig::default().effective_config();
    print_config(&cfg);
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let env = config::load();
    let warnings = validate(&env);
    for w in &warnings {
        eprintln!("WARNING: {}", w);
    }

    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        1
    }
}

/// Collect human-readable warnings for `env`.
pub fn validate(env: &config::EnvConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    let uri = &env.registry.tracking_uri;
    if !(uri.starts_with("http://") || uri.starts_with("https://")) {
        warnings.push(format!(
            "MLFLOW_TRACKING_URI ({}) is not an http(s) URL; registry calls will fail",
            uri
        ));
    }

    if !KNOWN_STAGES.contains(&env.target.stage.as_str()) {
        warnings.push(format!(
            "MODEL_STAGE ({}) is not one of {}",
            env.target.stage,
            KNOWN_STAGES.join(", ")
        ));
    }

    if let Some(digest) = &env.registry.artifact_sha256 {
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            warnings.push("MODEL_ARTIFACT_SHA256 is not a 64-character hex digest".to_string());
        }
    }

    if env.bind_addr.port() == 0 {
        warnings.push("SERVE_BIND_ADDR uses port 0; the server will pick a random port".to_string());
    }

    warnings
}

fn print_config(cfg: &EffectiveConfig) {
    println!("MLFLOW_TRACKING_URI={}", cfg.tracking_uri);
    println!("MODEL_NAME={}", cfg.model_name);
    println!("MODEL_STAGE={}", cfg.model_stage);
    println!(
        "MODEL_ARTIFACT_SHA256={}",
        if cfg.artifact_sha256_pinned { "<pinned>" } else { "" }
    );
    println!("SERVE_BIND_ADDR={}", cfg.bind_addr);
    println!("SERVE_REGISTRY_TIMEOUT={}", cfg.registry_timeout_secs);
    println!("SERVE_SHUTDOWN_TIMEOUT={}", cfg.shutdown_timeout_secs);
    println!("SERVE_LOG_FORMAT={}", cfg.log_format);
    println!("RUST_LOG={}", cfg.log_level);
}
