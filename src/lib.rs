//! # slipway
//!
//! A minimal asynchronous request pipeline. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! slipway specifies how one matched request flows through an ordered
//! middleware chain to a terminal handler and back out as exactly one
//! response — including when the handler defers its answer into background
//! work. Everything else about serving HTTP (TLS, body-size limits, slow
//! clients, rate limiting) belongs to the reverse proxy in front of you.
//!
//! The moving parts:
//!
//! - [`Future`] — a one-shot computation on the blocking pool; settles once,
//!   replays its outcome to late observers.
//! - [`Promise`] — chainable settle-once result: [`then`](Promise::then) for
//!   the success path, [`failure`](Promise::failure) for the error path.
//! - [`Middleware`] / [`Chain`] — ordered interceptors; each link forwards
//!   or short-circuits, and the completion sink fires exactly once per
//!   request no matter what.
//! - [`Responder`] — the single-use sink a handler must invoke exactly once,
//!   directly or from a promise continuation.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use slipway::{Future, Promise, Request, Responder, Response, Router, Server, Status};
//! use slipway::middleware::Trace;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .wrap(Trace::new())
//!         .get("/", home)
//!         .get("/fibo", fibo);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! // Synchronous: respond immediately.
//! fn home(_req: Request, responder: Responder) {
//!     responder.respond(Response::text("Welcome to slipway!"));
//! }
//!
//! // Deferred: park the responder in a promise chain and return at once.
//! fn fibo(_req: Request, responder: Responder) {
//!     let future = Future::compute(|| Ok(fibonacci(10)));
//!     let on_error = responder.clone();
//!     Promise::from_future(future)
//!         .then(move |n| responder.respond(Response::text(format!("result is {n}"))))
//!         .failure(move |e| {
//!             on_error.respond(Response::builder()
//!                 .status(Status::InternalServerError)
//!                 .text(e.to_string()));
//!         });
//! }
//!
//! fn fibonacci(n: u64) -> u64 {
//!     if n <= 1 { n } else { fibonacci(n - 1) + fibonacci(n - 2) }
//! }
//! ```

mod error;
mod future;
mod handler;
mod method;
mod promise;
mod request;
mod responder;
mod response;
mod router;
mod server;
mod status;

pub mod middleware;

pub use error::{Error, TaskError};
pub use future::{Completion, Future};
pub use handler::Handler;
pub use method::Method;
pub use middleware::{Chain, Middleware, Next};
pub use promise::{Promise, Reject, Resolve};
pub use request::Request;
pub use responder::Responder;
pub use response::{IntoResponse, Render, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
