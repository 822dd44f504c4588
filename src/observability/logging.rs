//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the host binary
//! - Pick the output format and default level from configuration
//!
//! # Design Decisions
//! - Library code only emits events; installing a subscriber is the host's call
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
}

fn default_directives(config: &ObservabilityConfig) -> String {
    format!(
        "treblle_relay={level},tower_http={level}",
        level = config.log_level
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let config = ObservabilityConfig {
            log_level: "debug".to_string(),
            ..ObservabilityConfig::default()
        };
        assert_eq!(default_directives(&config), "treblle_relay=debug,tower_http=debug");
    }
}
