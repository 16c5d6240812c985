//! The completion sink.
//!
//! A [`Responder`] finalizes one pipeline traversal. Exactly one `respond`
//! call is the contract; the handle is clonable so a handler can park one
//! clone in a success continuation and another in a failure sink — whichever
//! path fires delivers the response, the loser's call is ignored.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::warn;

use crate::response::{IntoResponse, Response};

/// Single-use completion handle for one request.
///
/// First `respond` wins. Later calls are a contract violation: they are
/// logged at `warn` and dropped, never delivered — a misbehaving handler
/// cannot replace a response already on its way out, and cannot take down
/// the worker either.
#[derive(Clone)]
pub struct Responder {
    tx: Arc<Mutex<Option<oneshot::Sender<Response>>>>,
}

impl Responder {
    /// A responder plus the receiving end the chain driver awaits.
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Arc::new(Mutex::new(Some(tx))) }, rx)
    }

    /// Delivers the final response for this request.
    pub fn respond(&self, response: impl IntoResponse) {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            // The receiver may already be gone (deadline expired); nothing
            // useful to do with the response then.
            Some(tx) => {
                let _ = tx.send(response.into_response());
            }
            None => warn!("responder invoked more than once; keeping the first response"),
        }
    }
}
