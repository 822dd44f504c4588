//! Startup orchestration.
//!
//! # Responsibilities
//! - Build telemetry from configuration
//! - Bind the listener and serve the demo router
//! - Tear telemetry down once the server has drained
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener starts last (traffic only when telemetry is ready)
//! - Publisher teardown runs on the blocking pool; it joins a thread

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::lifecycle::shutdown::Shutdown;
use crate::publisher::PublishError;
use crate::telemetry::Telemetry;

/// Errors that stop the host.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Publisher(#[from] PublishError),
}

/// Serve until `shutdown` fires, then tear telemetry down.
pub async fn run(config: RelayConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let telemetry = Telemetry::new(&config.telemetry)?;

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    let local_addr = listener.local_addr().map_err(StartupError::Serve)?;

    tracing::info!(
        address = %local_addr,
        capture_enabled = !telemetry.is_disabled(),
        "Listening for connections"
    );

    let app = crate::demo::router(telemetry.clone())
        .into_make_service_with_connect_info::<SocketAddr>();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.notified())
        .await;

    tracing::info!("HTTP server stopped, tearing down telemetry (in-flight deliveries are abandoned)");
    if let Err(e) = tokio::task::spawn_blocking(move || telemetry.teardown()).await {
        tracing::error!(error = %e, "Telemetry teardown failed");
    }

    served.map_err(StartupError::Serve)
}
