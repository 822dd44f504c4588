//! Telemetry capture subsystem.
//!
//! # Data Flow
//! ```text
//! Request start (capture.rs):
//!     template.rs payload copy → server/request facts → masked headers
//!     → body (if under the size limit) via transform.rs or JSON parse → masked
//!
//! Request end (capture.rs):
//!     status, masked headers, load time → body (unless streaming) → masked
//!
//! Teardown (capture.rs):
//!     raised error (errors.rs) → one `onError` entry → finished payload.rs value
//! ```
//!
//! # Design Decisions
//! - Hosts plug in through the view.rs traits, never through a concrete framework type
//! - Capture never fails the host request; every failure becomes an error entry
//! - A gatherer without credentials is disabled and every hook is a no-op

pub mod capture;
pub mod errors;
pub mod payload;
pub mod template;
pub mod transform;
pub mod view;

pub use capture::{Capture, Gatherer};
pub use errors::{PanicSite, RaisedError};
pub use payload::{ErrorEntry, Payload};
pub use template::PayloadTemplate;
pub use transform::{TransformError, Transformer};
pub use view::{OwnedRequest, OwnedResponse, RequestView, ResponseBody, ResponseView};
