//! Middleware chain.
//!
//! An ordered sequence of interceptors applied to every request before the
//! terminal route handler. Each link is invoked with the request, a [`Next`]
//! handle, and the traversal's [`Responder`], and must do exactly one of:
//!
//! - `next.respond(req, responder)` — forward to the next link (or the
//!   terminal handler if none remain), passing the same responder through
//!   unchanged, so the whole traversal has a single completion path;
//! - `responder.respond(…)` — short-circuit; later links and the terminal
//!   handler never run.
//!
//! [`Chain`] bundles a stack, a terminal handler, and an optional deadline,
//! and drives one traversal per [`run`](Chain::run) call. Traversals for
//! different requests are fully independent; interceptors within one
//! traversal run strictly in registration order.

mod trace;

pub use trace::Trace;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::responder::Responder;
use crate::response::Response;
use crate::status::Status;

/// A request interceptor.
///
/// Automatically implemented for closures of the right shape:
///
/// ```rust
/// use slipway::{Next, Request, Responder, Status};
///
/// // Reject anything without an authorization header, forward the rest.
/// let gate = |req: Request, next: Next, responder: Responder| {
///     if req.header("authorization").is_none() {
///         responder.respond(Status::Unauthorized);
///     } else {
///         next.respond(req, responder);
///     }
/// };
/// # fn assert_middleware(_: impl slipway::Middleware) {}
/// # assert_middleware(gate);
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next, responder: Responder);
}

impl<F> Middleware for F
where
    F: Fn(Request, Next, Responder) + Send + Sync + 'static,
{
    fn handle(&self, req: Request, next: Next, responder: Responder) {
        self(req, next, responder);
    }
}

type Stack = Arc<[Arc<dyn Middleware>]>;

/// Handle to the rest of the chain.
///
/// Consumed by `respond` — a link physically cannot forward twice.
pub struct Next {
    stack: Stack,
    handler: BoxedHandler,
    index: usize,
}

impl Next {
    /// Advances to the next interceptor, or to the terminal handler if the
    /// stack is exhausted.
    pub fn respond(self, req: Request, responder: Responder) {
        let Next { stack, handler, index } = self;
        match stack.get(index) {
            Some(link) => {
                let link = Arc::clone(link);
                link.handle(req, Next { stack, handler, index: index + 1 }, responder);
            }
            None => handler.call(req, responder),
        }
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An interceptor stack plus its terminal handler.
///
/// ```rust,no_run
/// use slipway::{Chain, Request, Responder, Response, middleware::Trace};
///
/// # async fn demo() {
/// let chain = Chain::new(|_req: Request, responder: Responder| {
///     responder.respond(Response::text("hello"));
/// })
/// .wrap(Trace::new());
///
/// let response = chain.run(Request::new(slipway::Method::Get, "/")).await;
/// # }
/// ```
pub struct Chain {
    stack: Vec<Arc<dyn Middleware>>,
    handler: BoxedHandler,
    deadline: Option<Duration>,
}

impl Chain {
    pub fn new(handler: impl Handler) -> Self {
        Self {
            stack: Vec::new(),
            handler: handler.into_boxed_handler(),
            deadline: None,
        }
    }

    pub(crate) fn from_parts(
        stack: Vec<Arc<dyn Middleware>>,
        handler: BoxedHandler,
        deadline: Option<Duration>,
    ) -> Self {
        Self { stack, handler, deadline }
    }

    /// Appends an interceptor. Interceptors run in the order they were added.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.stack.push(Arc::new(middleware));
        self
    }

    /// Caps how long a traversal may stay in flight. On expiry the request
    /// completes with `504 Gateway Timeout`; a late response from the
    /// abandoned handler is discarded.
    pub fn deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    /// Drives one traversal: interceptors in order, then the terminal
    /// handler, then await the single completion.
    ///
    /// Never returns an error. A traversal that drops every responder clone
    /// without responding — a rejected promise chain with no sink attached,
    /// say — surfaces as a default 500 rather than hanging the request.
    pub async fn run(&self, req: Request) -> Response {
        let (responder, settled) = Responder::channel();

        Next {
            stack: self.stack.clone().into(),
            handler: Arc::clone(&self.handler),
            index: 0,
        }
        .respond(req, responder);

        let outcome = async move {
            match settled.await {
                Ok(response) => response,
                Err(_) => {
                    warn!("pipeline dropped its responder without responding");
                    Response::builder()
                        .status(Status::InternalServerError)
                        .text("handler completed without a response")
                }
            }
        };

        match self.deadline {
            Some(limit) => timeout(limit, outcome).await.unwrap_or_else(|_| {
                Response::builder()
                    .status(Status::GatewayTimeout)
                    .text("deadline exceeded")
            }),
            None => outcome.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn hello(_req: Request, responder: Responder) {
        responder.respond(Response::text("hello"));
    }

    #[tokio::test]
    async fn empty_chain_reaches_the_terminal_handler() {
        let response = Chain::new(hello).run(Request::new(Method::Get, "/")).await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body_bytes(), b"hello");
    }

    #[tokio::test]
    async fn interceptors_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&seen);
        let second = Arc::clone(&seen);

        let chain = Chain::new(hello)
            .wrap(move |req: Request, next: Next, responder: Responder| {
                first.lock().unwrap().push("first");
                next.respond(req, responder);
            })
            .wrap(move |req: Request, next: Next, responder: Responder| {
                second.lock().unwrap().push("second");
                next.respond(req, responder);
            });

        chain.run(Request::new(Method::Get, "/")).await;
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn short_circuit_skips_everything_downstream() {
        let reached = Arc::new(AtomicUsize::new(0));
        let handler_probe = Arc::clone(&reached);

        let chain = Chain::new(move |_req: Request, responder: Responder| {
            handler_probe.fetch_add(1, Ordering::SeqCst);
            responder.respond(Response::text("handler"));
        })
        .wrap(|_req: Request, _next: Next, responder: Responder| {
            responder.respond(Status::Forbidden);
        });

        let response = chain.run(Request::new(Method::Get, "/secret")).await;
        assert_eq!(response.status_code(), 403);
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn silent_handler_becomes_a_default_500() {
        let chain = Chain::new(|_req: Request, responder: Responder| {
            drop(responder);
        });
        let response = chain.run(Request::new(Method::Get, "/")).await;
        assert_eq!(response.status_code(), 500);
    }

    #[tokio::test]
    async fn deadline_expiry_yields_504_exactly_once() {
        // Handler parks its responder in a task that never fires in time.
        let chain = Chain::new(|_req: Request, responder: Responder| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                responder.respond(Response::text("too late"));
            });
        })
        .deadline(Duration::from_millis(20));

        let response = chain.run(Request::new(Method::Get, "/slow")).await;
        assert_eq!(response.status_code(), 504);
    }
}
