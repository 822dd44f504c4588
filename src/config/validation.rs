//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check collector hosts are absolute http(s) URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Missing credentials are NOT an error: capture is disabled instead
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let telemetry = &config.telemetry;

    if telemetry.collector_hosts.is_empty() {
        errors.push(ValidationError::new(
            "telemetry.collector_hosts",
            "at least one collector host is required",
        ));
    }

    for (i, host) in telemetry.collector_hosts.iter().enumerate() {
        match Url::parse(host) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                format!("telemetry.collector_hosts[{}]", i),
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                format!("telemetry.collector_hosts[{}]", i),
                format!("invalid URL '{}': {}", host, e),
            )),
        }
    }

    if telemetry.timeout_ms == 0 {
        errors.push(ValidationError::new("telemetry.timeout_ms", "must be greater than 0"));
    }

    if telemetry.limit_request_body_size == 0 {
        errors.push(ValidationError::new(
            "telemetry.limit_request_body_size",
            "must be greater than 0",
        ));
    }

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
