//! credhub - credential provisioning admin service

use clap::Parser;
use credhub::config::Config;
use credhub::server::HttpServer;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "credhub", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CREDHUB_CONFIG", default_value = "config/service.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match Config::from_file(&args.config).await {
        Ok(config) => config,
        Err(e) => {
            info!("Configuration file not usable ({}), falling back to env/defaults", e);
            match Config::from_env() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let server = match HttpServer::new(&config).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "credhub listening on http://{}:{}",
        config.server.host, config.server.port
    );

    match server.start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
