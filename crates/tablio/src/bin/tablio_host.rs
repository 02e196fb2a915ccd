//! Runs the tablio host: the extension socket plus the control API.
//!
//! Usage: `cargo run --bin tablio-host` (reads `TABLIO_*` from the
//! environment or `.env`).

use tablio::config::HostConfig;
use tablio::server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = match HostConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("invalid configuration: {error}");
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut server = match Server::new(config).await {
        Ok(server) => server,
        Err(error) => {
            tracing::error!("failed to start host: {error}");
            std::process::exit(1);
        }
    };
    tracing::info!("waiting for the browser extension");

    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {error}");
    }
    tracing::info!("shutting down");
    if let Err(error) = server.shutdown() {
        tracing::warn!("{error}");
    }
}
