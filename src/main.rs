//! Demo host: an echo API with request telemetry attached.
//!
//! ```text
//!     Client ──▶ axum router ──▶ telemetry middleware ──▶ echo handlers
//!                                      │
//!                                      ▼
//!                              Publisher worker thread ──▶ collectors
//! ```

use std::path::PathBuf;
use clap::Parser;

use treblle_relay::config::loader::{from_env, load_config};
use treblle_relay::lifecycle::{signals, startup};
use treblle_relay::observability::logging;
use treblle_relay::Shutdown;

#[derive(Parser)]
#[command(name = "treblle-relay")]
#[command(about = "Echo API host with request telemetry", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => from_env(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "treblle-relay starting");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    startup::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
