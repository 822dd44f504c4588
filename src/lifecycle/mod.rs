//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Telemetry (gatherer + publisher worker) → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain connections → Publisher teardown → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
