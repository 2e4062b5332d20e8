//! CLI subcommands that talk to a running server over HTTP, enabling exec
//! probes and operator-driven reloads.
//!
//! ```bash
//! model-serve health   # Full health document, exits 0 when reachable
//! model-serve live     # Liveness probe
//! model-serve ready    # Readiness probe, exits 0 once a model is loaded
//! model-serve reload   # Reload the model from the registry
//! ```

pub mod client;
pub mod config_cmd;
pub mod health;
pub mod model_cmd;

pub use client::{CliError, CliHttpClient};
pub use health::{run_health, run_liveness, run_readiness};
pub use model_cmd::{run_predict, run_reload};

/// Default base URL of a locally running server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Exit codes shared by all client subcommands.
pub mod exit_code {
    pub const OK: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 3;
}

/// Server URL from `SERVE_URL` or the default.
pub fn get_server_url() -> String {
    match std::env::var("SERVE_URL") {
        Ok(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
        _ => DEFAULT_SERVER_URL.to_string(),
    }
}
