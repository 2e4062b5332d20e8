//! model-serve entry point.
//!
//! ## CLI Subcommands
//!
//! - `model-serve` or `model-serve serve` - Run the HTTP server (default)
//! - `model-serve health` - Full health document (exit 0/1/3)
//! - `model-serve live` - Liveness probe
//! - `model-serve ready` - Readiness probe
//! - `model-serve reload` - Reload the model on a running server
//! - `model-serve predict <f1> <f2> ...` - Predict through a running server

use std::process::ExitCode;

use model_serve::cli::{
    self, config_cmd, get_server_url, run_health, run_liveness, run_predict, run_readiness,
    run_reload,
};
use model_serve::config;
use model_serve::telemetry::init_logging;
use model_serve::Runtime;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "serve" | "" => run_server().await,
        "health" => {
            let code = run_health(&get_server_url()).await;
            ExitCode::from(code as u8)
        }
        "live" | "liveness" => {
            let code = run_liveness(&get_server_url()).await;
            ExitCode::from(code as u8)
        }
        "ready" | "readiness" => {
            let code = run_readiness(&get_server_url()).await;
            ExitCode::from(code as u8)
        }
        "reload" => {
            let code = run_reload(&get_server_url()).await;
            ExitCode::from(code as u8)
        }
        "predict" => {
            let code = run_predict(&get_server_url(), &args[2..]).await;
            ExitCode::from(code as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => {
                    let code = config_cmd::run_validate();
                    ExitCode::from(code as u8)
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::from(cli::exit_code::USAGE as u8)
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("model-serve {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::from(cli::exit_code::USAGE as u8)
        }
    }
}

async fn run_server() -> ExitCode {
    let config = config::load();

    if let Err(e) = init_logging(&config.log) {
        eprintln!("Logging setup failed: {}", e);
        return ExitCode::from(cli::exit_code::USAGE as u8);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        tracking_uri = %config.registry.tracking_uri,
        model = %config.target.name,
        stage = %config.target.stage,
        bind_addr = %config.bind_addr,
        "starting model-serve"
    );

    let runtime = match Runtime::new(config) {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "runtime setup failed");
            return ExitCode::FAILURE;
        }
    };

    match runtime.run().await {
        Ok(()) => {
            tracing::info!("server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "server error");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "model-serve - Registry-backed model serving v{}

USAGE:
    model-serve [COMMAND] [ARGS]

COMMANDS:
    serve        Run the HTTP server (default when no command given)
    health       Print the server's health document
    live         Liveness probe (exit 0 if the server answers)
    ready        Readiness probe (exit 0 if a model is loaded)
    reload       Reload the model from the registry
    predict      Predict a label for the given feature values
    config       Inspect configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

EXAMPLES:
    model-serve                                # Run the server
    model-serve ready                          # Readiness probe
    model-serve reload                         # Pick up a newly promoted version
    model-serve predict 5.1 3.5 1.4 0.2        # Predict one Iris sample
    model-serve config validate                # Validate configuration

ENVIRONMENT:
    MLFLOW_TRACKING_URI    Registry endpoint (default: http://localhost:5000)
    MODEL_NAME             Registered model name (default: IrisClassifier)
    MODEL_STAGE            Stage to serve (default: Production)
    MODEL_ARTIFACT_SHA256  Pin the artifact digest (optional)
    SERVE_BIND_ADDR        Listen address (default: 0.0.0.0:8000)
    SERVE_URL              Server URL for client commands (default: http://127.0.0.1:8000)
    SERVE_LOG_FORMAT       json or pretty (default: json)
    RUST_LOG               Log filter (default: info)

EXIT CODES:
    0  Success / Ready
    1  Failure / Not ready
    2  Usage or configuration error
    3  Connection error
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "serve" => {
            eprintln!(
                "model-serve serve - Run the HTTP server

USAGE:
    model-serve serve

DESCRIPTION:
    Binds SERVE_BIND_ADDR and attempts to load MODEL_NAME at MODEL_STAGE
    from MLFLOW_TRACKING_URI. A failed startup load is logged and the
    server keeps running; /predict answers 503 until POST /reload
    succeeds. Ctrl-C drains open connections for up to
    SERVE_SHUTDOWN_TIMEOUT seconds.

ROUTES:
    GET  /health         Health document
    GET  /health/live    Liveness probe
    GET  /health/ready   Readiness probe (503 until a model is loaded)
    POST /reload         Reload the model
    POST /predict        {{\"features\": [f64; 4]}}
    GET  /metrics        Prometheus text exposition
"
            );
        }
        "health" | "live" | "liveness" | "ready" | "readiness" => {
            eprintln!(
                "model-serve health | live | ready - Probe a running server

USAGE:
    model-serve health
    model-serve live
    model-serve ready

EXIT CODES:
    0  Healthy / alive / ready
    1  Reachable but not ready
    3  Connection error

KUBERNETES USAGE:
    readinessProbe:
      exec:
        command: [model-serve, ready]
      periodSeconds: 5
"
            );
        }
        "reload" => {
            eprintln!(
                "model-serve reload - Reload the model on a running server

USAGE:
    model-serve reload

DESCRIPTION:
    Calls POST /reload. On failure the server keeps serving the
    previously loaded model.

EXIT CODES:
    0  Reloaded
    1  Registry error (see message)
    3  Connection error
"
            );
        }
        "predict" => {
            eprintln!(
                "model-serve predict - Predict through a running server

USAGE:
    model-serve predict <F1> <F2> ...

EXAMPLES:
    model-serve predict 5.1 3.5 1.4 0.2

EXIT CODES:
    0  Prediction printed
    1  Rejected by the server (not ready, wrong width)
    2  Invalid arguments
    3  Connection error
"
            );
        }
        "config" => {
            eprintln!(
                "model-serve config - Inspect configuration

USAGE:
    model-serve config <SUBCOMMAND>

SUBCOMMANDS:
    show       Print the effective configuration (default)
    defaults   Print built-in defaults
    validate   Warn about likely misconfiguration (exit 1 on warnings)
"
            );
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
        }
    }
}
