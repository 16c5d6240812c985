//! Error types.
//!
//! Two kinds of failure exist in slipway and they never mix:
//!
//! - [`Error`] — infrastructure failures: binding a port, accepting a
//!   connection. Returned by [`Server::serve`](crate::Server::serve).
//! - [`TaskError`] — the settlement error carried by a failed
//!   [`Future`](crate::Future) or rejected [`Promise`](crate::Promise).
//!   Application-level failures (404, 500, etc.) are expressed as
//!   [`Response`](crate::Response) values, never as either error type.

use std::any::Any;
use std::fmt;

/// The error type returned by slipway's fallible infrastructure operations.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}

// ── TaskError ─────────────────────────────────────────────────────────────────

/// The failure outcome of a deferred computation.
///
/// `Clone` because a settled outcome may be replayed to observers registered
/// after the fact, and because a rejection propagates unchanged through a
/// whole `then`/`failure` chain.
#[derive(Clone, Debug)]
pub struct TaskError {
    message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Builds a `TaskError` from a caught panic payload.
    ///
    /// `std::panic::catch_unwind` hands back `Box<dyn Any>`; panics raised
    /// with `panic!("…")` carry a `String` or `&str` payload we can recover.
    /// Anything else gets a generic message.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task panicked".to_owned()
        };
        Self { message }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TaskError {}

impl From<&str> for TaskError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskError {
    fn from(s: String) -> Self {
        Self { message: s }
    }
}
