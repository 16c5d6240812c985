//! Request-logging interceptor.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use super::{Middleware, Next};
use crate::request::Request;
use crate::responder::Responder;

type Clock = Box<dyn Fn() -> SystemTime + Send + Sync>;
type Sink = Box<dyn Fn(u32, SystemTime, &str) + Send + Sync>;

/// Logs one line per request — process identity, timestamp, path — then
/// always forwards. Never short-circuits.
///
/// Identity, clock, and sink are injected at construction rather than read
/// from ambient process state, so tests and embedders can pin all three:
///
/// ```rust
/// use slipway::middleware::Trace;
///
/// let trace = Trace::new()
///     .with_identity(1)
///     .with_sink(|pid, _at, path| eprintln!("[pid:{pid}] {path}"));
/// ```
///
/// A panicking sink is caught and ignored: logging must never affect the
/// completion of the request it observes.
pub struct Trace {
    pid: u32,
    clock: Clock,
    sink: Sink,
}

impl Trace {
    /// Real process id, real clock, `tracing::info!` sink.
    pub fn new() -> Self {
        Self {
            pid: std::process::id(),
            clock: Box::new(SystemTime::now),
            sink: Box::new(default_sink),
        }
    }

    pub fn with_identity(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> SystemTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_sink(mut self, sink: impl Fn(u32, SystemTime, &str) + Send + Sync + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

fn default_sink(pid: u32, at: SystemTime, path: &str) {
    let unix_secs = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    info!(pid, unix_secs, path, "request");
}

impl Middleware for Trace {
    fn handle(&self, req: Request, next: Next, responder: Responder) {
        let at = (self.clock)();
        if catch_unwind(AssertUnwindSafe(|| (self.sink)(self.pid, at, req.path()))).is_err() {
            warn!("log sink panicked; request continues");
        }
        next.respond(req, responder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::middleware::Chain;
    use crate::response::Response;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn records_identity_clock_and_path_then_forwards() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);

        let epoch = UNIX_EPOCH + std::time::Duration::from_secs(1_000);
        let trace = Trace::new()
            .with_identity(42)
            .with_clock(move || epoch)
            .with_sink(move |pid, at, path| {
                sink_lines.lock().unwrap().push((pid, at, path.to_owned()));
            });

        let chain = Chain::new(|_req: Request, responder: Responder| {
            responder.respond(Response::text("through"));
        })
        .wrap(trace);

        let response = chain.run(Request::new(Method::Get, "/fibo")).await;
        assert_eq!(response.body_bytes(), b"through");
        assert_eq!(*lines.lock().unwrap(), vec![(42, epoch, "/fibo".to_owned())]);
    }

    #[tokio::test]
    async fn panicking_sink_does_not_break_completion() {
        let trace = Trace::new().with_sink(|_, _, _| panic!("sink is broken"));
        let chain = Chain::new(|_req: Request, responder: Responder| {
            responder.respond(Response::text("still fine"));
        })
        .wrap(trace);

        let response = chain.run(Request::new(Method::Get, "/")).await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body_bytes(), b"still fine");
    }
}
