//! Security subsystem: redaction of captured telemetry.
//!
//! # Data Flow
//! ```text
//! Captured headers / bodies (serde_json::Value)
//!     → masking.rs (hide configured keys, recursively)
//!     → auth_header.rs (keep auth scheme, hide credentials)
//!     → Stored on the payload
//! ```
//!
//! # Design Decisions
//! - Masking happens before anything is stored on a payload
//! - Shape and value length are preserved so payloads stay comparable
//! - Unknown auth schemes are masked entirely

pub mod auth_header;
pub mod masking;

pub use auth_header::mask_auth_header;
pub use masking::{mask, mask_owned};
