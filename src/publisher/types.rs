//! Publisher error types.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while delivering payloads.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Collector request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Collector responded with status {0}")]
    Status(u16),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to start publisher worker: {0}")]
    Worker(#[from] std::io::Error),

    #[error("No collector hosts configured")]
    NoCollectorHosts,

    #[error("Transport is closed")]
    Closed,
}

/// Result type alias for publishing.
pub type Result<T> = std::result::Result<T, PublishError>;
