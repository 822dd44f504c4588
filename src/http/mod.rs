//! axum integration.
//!
//! # Data Flow
//! ```text
//! Request
//!     → middleware.rs (buffer body if captured, on_request_start via view.rs)
//!     → inner router
//!     → middleware.rs (buffer body unless streaming, on_request_end)
//!     → on_request_teardown → Publisher::send
//!     → Send to client
//! ```

pub mod middleware;
pub mod view;

pub use middleware::{attach, telemetry_middleware};
pub use view::{AxumRequest, AxumResponse, SERVER_SOFTWARE};
