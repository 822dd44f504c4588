//! Payload delivery subsystem.
//!
//! # Data Flow
//! ```text
//! Request path:
//!     Publisher::send(payload) → unbounded channel (returns immediately)
//!
//! Worker thread (worker.rs):
//!     recv → hosts.rs picks next collector → encode JSON
//!     → spawn local attempt → transport.rs POST, bounded by timeout
//!     → outcome logged at debug
//!
//! Teardown:
//!     Close command → transport closed → runtime dropped → thread joined
//! ```

pub mod hosts;
pub mod transport;
pub mod types;
pub mod worker;

pub use hosts::HostRotation;
pub use transport::{HttpTransport, Transport, API_KEY_HEADER};
pub use types::{PublishError, Result};
pub use worker::Publisher;
