//! User-supplied body transformers.
//!
//! A transformer turns raw body bytes into any `Serialize` value. Every way
//! it can fail (returned error, unserializable output, panic) is caught here
//! and reported as an [`ErrorEntry`] instead of reaching the host.

use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::Arc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::gatherer::errors::{panic_message, short_type_name};
use crate::gatherer::payload::ErrorEntry;

/// Failures raised by the transformer boundary itself.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("transformer must return a JSON serializable value: {0}")]
    NotSerializable(#[source] serde_json::Error),

    #[error("transformer panicked: {0}")]
    Panicked(String),
}

type TransformFn = dyn Fn(&[u8]) -> Result<Value, ErrorEntry> + Send + Sync;

/// A body transformer wrapped in a recoverable-error boundary.
///
/// Error entries point at the place the transformer was constructed.
#[derive(Clone)]
pub struct Transformer {
    inner: Arc<TransformFn>,
    site: &'static Location<'static>,
}

impl Transformer {
    #[track_caller]
    pub fn new<F, T, E>(f: F) -> Self
    where
        F: Fn(&[u8]) -> Result<T, E> + Send + Sync + 'static,
        T: Serialize,
        E: std::error::Error + 'static,
    {
        let site = Location::caller();
        let inner = move |bytes: &[u8]| -> Result<Value, ErrorEntry> {
            let output = f(bytes).map_err(|e| entry_at(site, short_type_name::<E>(), &e))?;
            serde_json::to_value(output).map_err(|e| {
                entry_at(site, "TransformError", &TransformError::NotSerializable(e))
            })
        };

        Self {
            inner: Arc::new(inner),
            site,
        }
    }

    /// Run the transformer; never panics.
    pub fn apply(&self, bytes: &[u8]) -> Result<Value, ErrorEntry> {
        match catch_unwind(AssertUnwindSafe(|| (self.inner)(bytes))) {
            Ok(result) => result,
            Err(payload) => Err(entry_at(
                self.site,
                "TransformError",
                &TransformError::Panicked(panic_message(payload.as_ref())),
            )),
        }
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("site", &format_args!("{}:{}", self.site.file(), self.site.line()))
            .finish()
    }
}

fn entry_at(site: &Location<'_>, kind: &str, err: &dyn std::error::Error) -> ErrorEntry {
    ErrorEntry::new(kind, err.to_string(), site.file(), site.line())
}
