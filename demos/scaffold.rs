//! Scaffold application — the two profiles a generated project starts from.
//!
//! Run the minimal profile (one synchronous route):
//!   RUST_LOG=info cargo run --example scaffold
//!
//! Run the fullstack profile (adds a deferred-computation route and a
//! template-rendered index):
//!   RUST_LOG=info cargo run --example scaffold -- --fullstack
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/fibo

use slipway::middleware::Trace;
use slipway::{Future, Promise, Render, Request, Responder, Response, Router, Server, Status, TaskError};

/// Which route set gets registered. A build-time/config concern — two
/// profiles, not runtime polymorphism.
#[derive(Clone, Copy)]
enum Profile {
    Minimal,
    Fullstack,
}

impl Profile {
    fn from_args() -> Self {
        if std::env::args().any(|a| a == "--fullstack") {
            Self::Fullstack
        } else {
            Self::Minimal
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut app = Router::new().wrap(Trace::new());

    app = match Profile::from_args() {
        Profile::Minimal => app.get("/", home),
        Profile::Fullstack => app.get("/", index).get("/fibo", fibo),
    };

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET / (minimal) — synchronous: respond immediately, default 200.
fn home(_req: Request, responder: Responder) {
    responder.respond(Response::text("Welcome to slipway!"));
}

// GET / (fullstack) — a custom body rendered by a view engine at write-out.
fn index(_req: Request, responder: Responder) {
    responder.respond(Response::custom(IndexPage { name: "slipway" }));
}

// GET /fibo — deferred: the CPU-bound work runs on the blocking pool, the
// responder is parked in the promise chain, and exactly one of the two
// continuations delivers the response.
fn fibo(_req: Request, responder: Responder) {
    let future = Future::compute(|| Ok(fibonacci(10)));
    let on_error = responder.clone();

    Promise::from_future(future)
        .then(move |n| responder.respond(Response::text(format!("result is {n}"))))
        .failure(move |e| {
            on_error.respond(
                Response::builder()
                    .status(Status::InternalServerError)
                    .text(e.to_string()),
            );
        });
}

fn fibonacci(n: u64) -> u64 {
    if n <= 1 { n } else { fibonacci(n - 1) + fibonacci(n - 2) }
}

/// Stand-in for a real template engine: the pipeline only sees the `Render`
/// seam.
struct IndexPage {
    name: &'static str,
}

impl Render for IndexPage {
    fn render(&self) -> Result<String, TaskError> {
        Ok(format!("<h1>Hello, {}!</h1>", self.name))
    }
}
