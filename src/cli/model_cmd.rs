//! Model subcommands: reload, predict.
//!
//! Both talk to a running server. Exit codes: 0 on success, 1 when the
//! server rejects the request, 3 on connection failure.

use super::{exit_code, CliError, CliHttpClient};

/// Run `reload`, asking the server to re-resolve its configured model.
pub async fn run_reload(base_url: &str) -> i32 {
    let client = CliHttpClient::new(base_url.to_string());
    match client.reload().await {
        Ok(response) => {
            match response.model_identity {
                Some(identity) => println!("Reloaded {}", identity),
                None => println!("Reloaded"),
            }
            exit_code::OK
        }
        Err(e) => report_error(&e),
    }
}

/// Run `predict <f1> <f2> ...`.
pub async fn run_predict(base_url: &str, args: &[String]) -> i32 {
    let features = match parse_features(args) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_code::USAGE;
        }
    };

    let client = CliHttpClient::new(base_url.to_string());
    match client.predict(features).await {
        Ok(response) => {
            println!("prediction:     {}", response.prediction);
            println!("model_identity: {}", response.model_identity);
            exit_code::OK
        }
        Err(e) => report_error(&e),
    }
}

/// Parse positional feature values.
pub fn parse_features(args: &[String]) -> Result<Vec<f64>, String> {
    if args.is_empty() {
        return Err("predict requires at least one feature value".to_string());
    }
    args.iter()
        .map(|a| {
            a.parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", a))
        })
        .collect()
}

fn report_error(err: &CliError) -> i32 {
    eprintln!("Error: {}", err);
    match err {
        CliError::Connection(_) => {
            eprintln!("Is the server running? Check SERVE_URL.");
            exit_code::CONNECTION
        }
        _ => exit_code::FAILURE,
    }
}
