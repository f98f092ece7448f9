use std::sync::Arc;

use clap::Parser;
use tokengate::cli::{Args, build_gate, init_logging, load_jwt_secret};
use tokengate::{create_app, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let secret = if args.uses_secret() {
        let Some(secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
            std::process::exit(1);
        };
        Some(secret)
    } else {
        None
    };

    let gate = match build_gate(&args, secret) {
        Ok(gate) => Arc::new(gate),
        Err(e) => {
            error!(error = %e, "Invalid authentication configuration");
            std::process::exit(1);
        }
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    if let Ok(local_addr) = listener.local_addr() {
        info!(address = %local_addr, algorithm = %args.algorithm, "Listening");
    }

    if let Err(e) = run_server(listener, create_app(gate)).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
