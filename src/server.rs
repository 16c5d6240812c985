//! HTTP transport and graceful shutdown.
//!
//! The server is a thin adapter: hyper accepts connections and hands each
//! request to the pipeline; the pipeline owns everything between "request
//! delivered" and "response produced". All failures become responses —
//! hyper never sees an error from dispatch.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** (what Kubernetes and `kill` send) or **Ctrl-C** the server:
//!
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::handler::Handler;
use crate::method::Method;
use crate::middleware::Chain;
use crate::request::Request;
use crate::responder::Responder;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    deadline: Option<Duration>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, deadline: None }
    }

    /// Caps how long any single request may stay in flight. On expiry the
    /// client gets `504 Gateway Timeout` and the abandoned handler's late
    /// response, if any, is discarded.
    pub fn deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared across concurrent connection tasks without copying the
        // routing table or the middleware stack.
        let router = Arc::new(router);
        let deadline = self.deadline;

        info!(addr = %self.addr, "slipway listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a shutdown signal stops
                // the accept loop even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, not once
                        // per connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, deadline, req).await }
                        });

                        // `auto::Builder` handles both HTTP/1.1 and HTTP/2,
                        // whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection before returning.
        while tasks.join_next().await.is_some() {}

        info!("slipway stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request into the pipeline and produces one response.
///
/// The error type is [`Infallible`](std::convert::Infallible): unknown
/// methods become 405, unreadable bodies 400, unmatched paths a 404 terminal
/// handler (after the middleware stack — interceptors see every request),
/// and handler failures whatever `Response` their promise chain produced.
async fn dispatch(
    router: Arc<Router>,
    deadline: Option<Duration>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let method = match req.method().as_str().parse::<Method>() {
        Ok(m) => m,
        Err(()) => return Ok(Response::status(Status::MethodNotAllowed).into_http()),
    };
    let path = req.uri().path().to_owned();

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(%path, "failed to read request body: {e}");
            return Ok(Response::status(Status::BadRequest).into_http());
        }
    };

    let mut request = Request::new(method, path.clone()).with_body(body.to_vec());
    for (name, value) in &parts.headers {
        request = request.with_header(name.as_str(), value.to_str().unwrap_or_default());
    }

    let (handler, params) = match router.lookup(method, &path) {
        Some((handler, params)) => (handler, params),
        None => (not_found.into_boxed_handler(), HashMap::new()),
    };
    let request = request.with_params(params);

    let chain = Chain::from_parts(router.stack().to_vec(), handler, deadline);
    Ok(chain.run(request).await.into_http())
}

/// Terminal handler for unmatched paths. Runs after the middleware stack, so
/// a short-circuiting interceptor (static assets, say) gets first refusal.
fn not_found(_req: Request, responder: Responder) {
    responder.respond(Status::NotFound);
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C, for
/// local dev). On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves — on non-Unix platforms the SIGTERM arm is
    // effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
