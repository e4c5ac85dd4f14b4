//! Multi-environment configuration service.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file ──▶ config ──▶ registry (EnvRegistry per setting)
//!                                   │
//!   Client Request                  ▼
//!   ─────────────▶ alias rewrite ─▶ http server ─▶ environment scope ─▶ handlers
//!                                                       │
//!                                                       ▼
//!                                               context (current env)
//!                                                       │
//!                                                       ▼
//!                                         outbound ?environment= propagation
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use multienv::config::load_config;
use multienv::http::HttpServer;
use multienv::lifecycle::Shutdown;
use multienv::observability::init_logging;

/// Level used until the configured one is known.
const BOOTSTRAP_LOG_LEVEL: &str = "info";

#[derive(Parser)]
#[command(name = "multienv-server")]
#[command(about = "Serves per-environment configuration", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/multienv.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let logging = init_logging(BOOTSTRAP_LOG_LEVEL)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "multienv-server starting"
    );

    let config = load_config(&args.config).inspect_err(|e| {
        tracing::error!(config = %args.config.display(), error = %e, "Failed to load configuration");
    })?;
    logging.set_level(&config.observability.log_level)?;
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environments = config.environments.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Service configured"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
