//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (TREBLLE_API_KEY, TREBLLE_PROJECT_ID)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → TelemetryConfig handed to the Telemetry facade
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Missing credentials disable capture instead of failing the host

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{LogFormat, ObservabilityConfig, RelayConfig, TelemetryConfig};
