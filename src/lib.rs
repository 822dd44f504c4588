//! Request telemetry capture, masking and publishing.
//!
//! A [`Gatherer`](gatherer::Gatherer) builds one payload per request from
//! host-supplied views, masking configured secrets. A
//! [`Publisher`](publisher::Publisher) ships finished payloads to the
//! collectors from its own worker thread. [`Telemetry`] ties the two together
//! and [`http::attach`] installs it on an axum router.

pub mod config;
pub mod demo;
pub mod gatherer;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod publisher;
pub mod security;
pub mod telemetry;

pub use config::schema::{RelayConfig, TelemetryConfig};
pub use gatherer::{Gatherer, Payload, RaisedError, Transformer};
pub use lifecycle::Shutdown;
pub use publisher::Publisher;
pub use telemetry::Telemetry;
