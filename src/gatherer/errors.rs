//! Turning failures into payload error entries.

use std::any::Any;
use std::cell::RefCell;
use std::panic::Location;
use std::sync::Once;

use crate::gatherer::payload::ErrorEntry;

/// An unhandled error raised while the host processed a request.
///
/// Handed to teardown; becomes one entry in `errors`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaisedError {
    kind: String,
    message: String,
    file: String,
    line: u32,
}

impl RaisedError {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            file: file.into(),
            line,
        }
    }

    /// Record `err`, locating it at the caller.
    #[track_caller]
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let location = Location::caller();
        Self::new(
            short_type_name::<E>(),
            err.to_string(),
            location.file(),
            location.line(),
        )
    }

    /// Record a caught panic raised at `site`.
    pub fn from_panic(payload: &(dyn Any + Send), site: Option<PanicSite>) -> Self {
        let site = site.unwrap_or_default();
        Self::new("panic", panic_message(payload), site.file, site.line)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn to_entry(&self) -> ErrorEntry {
        ErrorEntry::new(&self.kind, &self.message, &self.file, self.line)
    }
}

/// Where a panic was raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanicSite {
    pub file: String,
    pub line: u32,
}

thread_local! {
    static LAST_PANIC_SITE: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a panic hook that remembers where the last panic on each thread was raised.
///
/// The previously installed hook still runs. Installing more than once is a no-op.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                let site = PanicSite {
                    file: location.file().to_string(),
                    line: location.line(),
                };
                LAST_PANIC_SITE.with(|last| *last.borrow_mut() = Some(site));
            }
            previous(info);
        }));
    });
}

/// Take the site of the last panic raised on this thread.
///
/// `None` unless [`install_panic_hook`] ran before the panic.
pub fn take_panic_site() -> Option<PanicSite> {
    LAST_PANIC_SITE.with(|last| last.borrow_mut().take())
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Message carried by a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
