//! Probe subcommands: health, live, ready.
//!
//! Exit codes: 0 healthy/ready, 1 reachable but not ready, 3 connection
//! failure.

use super::{exit_code, CliHttpClient};
use crate::health::HealthReport;

/// Run `health`, printing the full health document.
pub async fn run_health(base_url: &str) -> i32 {
    let client = CliHttpClient::new(base_url.to_string());
    match client.health().await {
        Ok(report) => {
            print_report(&report);
            exit_code::OK
        }
        Err(e) => connection_failure(&e),
    }
}

/// Run `live`: succeeds whenever the process answers.
pub async fn run_liveness(base_url: &str) -> i32 {
    run_probe(base_url, "/health/live", "alive").await
}

/// Run `ready`: succeeds only when a model is loaded.
pub async fn run_readiness(base_url: &str) -> i32 {
    run_probe(base_url, "/health/ready", "ready").await
}

async fn run_probe(base_url: &str, path: &str, what: &str) -> i32 {
    let client = CliHttpClient::new(base_url.to_string());
    match client.probe(path).await {
        Ok(true) => {
            println!("{}", what);
            exit_code::OK
        }
        Ok(false) => {
            println!("not {}", what);
            exit_code::FAILURE
        }
        Err(e) => connection_failure(&e),
    }
}

fn connection_failure(err: &super::CliError) -> i32 {
    eprintln!("Error contacting model server: {}", err);
    match err {
        super::CliError::Connection(_) => {
            eprintln!("Is the server running? Check SERVE_URL.");
            exit_code::CONNECTION
        }
        _ => exit_code::FAILURE,
    }
}

pub(crate) fn print_report(report: &HealthReport) {
    println!("status:         {}", report.status);
    println!("ready:          {}", report.ready);
    println!("model_loaded:   {}", report.model_loaded);
    match &report.model_identity {
        Some(identity) => println!("model_identity: {}", identity),
        None => println!("model_identity: -"),
    }
    if let Some(version) = &report.model_version {
        println!("model_version:  {}", version);
    }
    if let Some(loaded_at) = &report.loaded_at {
        println!("loaded_at:      {}", loaded_at.to_rfc3339());
    }
    println!("uptime_secs:    {}", report.uptime_secs);
}
