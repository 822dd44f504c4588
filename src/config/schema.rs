//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashSet;
use serde::{Deserialize, Serialize};

/// Collector endpoints payloads are rotated across.
pub const DEFAULT_COLLECTOR_HOSTS: [&str; 3] = [
    "https://rocknrolla.treblle.com",
    "https://punisher.treblle.com",
    "https://sicario.treblle.com",
];

/// Keys masked in headers and bodies unless configured otherwise.
pub const DEFAULT_HIDDEN_KEYS: [&str; 12] = [
    "password",
    "pwd",
    "secret",
    "password_confirmation",
    "passwordConfirmation",
    "cc",
    "card_number",
    "cardNumber",
    "ccv",
    "ssn",
    "credit_score",
    "creditScore",
];

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "TREBLLE_API_KEY";

/// Environment variable holding the project ID.
pub const PROJECT_ID_ENV: &str = "TREBLLE_PROJECT_ID";

/// Root configuration for the relay and its demo host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Telemetry capture and publishing.
    pub telemetry: TelemetryConfig,

    /// Demo listener settings.
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Telemetry capture and publishing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Collector API key. Capture is disabled when missing.
    pub api_key: Option<String>,

    /// Collector project ID. Capture is disabled when missing.
    pub project_id: Option<String>,

    /// Header and body keys whose values are masked.
    pub hidden_keys: HashSet<String>,

    /// Mask the Authorization header while keeping a known scheme visible.
    pub mask_auth_header: bool,

    /// Request bodies with a declared length at or above this are not captured.
    pub limit_request_body_size: u64,

    /// Ordered collector base URLs.
    pub collector_hosts: Vec<String>,

    /// Per-attempt delivery timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project_id: None,
            hidden_keys: DEFAULT_HIDDEN_KEYS.iter().map(|k| k.to_string()).collect(),
            mask_auth_header: true,
            limit_request_body_size: 4 * 1024 * 1024, // 4MiB
            collector_hosts: DEFAULT_COLLECTOR_HOSTS.iter().map(|h| h.to_string()).collect(),
            timeout_ms: 2000,
        }
    }
}

impl TelemetryConfig {
    /// Create a configuration with the given credentials and defaults elsewhere.
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            project_id: Some(project_id.into()),
            ..Self::default()
        }
    }

    /// Both credentials are present and non-empty.
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.api_key) && present(&self.project_id)
    }

    /// Add a key to the masked set.
    pub fn hide_key(mut self, key: impl Into<String>) -> Self {
        self.hidden_keys.insert(key.into());
        self
    }

    /// Remove a key from the masked set.
    pub fn reveal_key(mut self, key: &str) -> Self {
        self.hidden_keys.remove(key);
        self
    }

    /// Fill credentials from `TREBLLE_API_KEY` / `TREBLLE_PROJECT_ID` when set.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(project) = std::env::var(PROJECT_ID_ENV) {
            if !project.is_empty() {
                self.project_id = Some(project);
            }
        }
    }
}

/// Listener configuration for the demo host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelemetryConfig::default();
        assert!(config.hidden_keys.contains("password"));
        assert!(config.hidden_keys.contains("creditScore"));
        assert_eq!(config.hidden_keys.len(), 12);
        assert!(config.mask_auth_header);
        assert_eq!(config.limit_request_body_size, 4_194_304);
        assert_eq!(config.collector_hosts.len(), 3);
        assert_eq!(config.timeout_ms, 2000);
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_credentials() {
        assert!(TelemetryConfig::new("key", "project").has_credentials());
        assert!(!TelemetryConfig::new("", "project").has_credentials());
        assert!(!TelemetryConfig::new("key", "").has_credentials());
    }

    #[test]
    fn test_hidden_keys_are_mutable() {
        let config = TelemetryConfig::default()
            .hide_key("api_token")
            .reveal_key("cc");
        assert!(config.hidden_keys.contains("api_token"));
        assert!(!config.hidden_keys.contains("cc"));
    }

    #[test]
    fn test_partial_toml() {
        let config: RelayConfig = toml::from_str(
            r#"
            [telemetry]
            api_key = "k"
            project_id = "p"
            mask_auth_header = false

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert!(config.telemetry.has_credentials());
        assert!(!config.telemetry.mask_auth_header);
        assert_eq!(config.telemetry.collector_hosts.len(), 3);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }
}
