//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gatherer / publisher / http middleware:
//!     → tracing events with structured fields
//!
//! Host binary:
//!     → logging.rs installs EnvFilter + fmt layer (json | pretty)
//! ```
//!
//! # Design Decisions
//! - Delivery outcomes log at debug; capture failures log at error
//! - Payload contents are never logged

pub mod logging;
