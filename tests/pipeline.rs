//! End-to-end pipeline scenarios, driven through `Chain::run` — no sockets.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use slipway::middleware::Trace;
use slipway::{
    Chain, Future, Method, Next, Promise, Request, Responder, Response, Status, TaskError,
};

fn fibonacci(n: u64) -> u64 {
    if n <= 1 { n } else { fibonacci(n - 1) + fibonacci(n - 2) }
}

/// Handler that defers fibonacci(n) through the full Future → Promise chain.
fn deferred_fibo(n: u64) -> impl Fn(Request, Responder) + Send + Sync + 'static {
    move |_req, responder| {
        let future = Future::compute(move || Ok(fibonacci(n)));
        let on_error = responder.clone();
        Promise::from_future(future)
            .then(move |result| responder.respond(Response::text(format!("result is {result}"))))
            .failure(move |e| {
                on_error.respond(
                    Response::builder()
                        .status(Status::InternalServerError)
                        .text(e.to_string()),
                );
            });
    }
}

#[tokio::test]
async fn logging_chain_with_synchronous_handler() {
    let logged = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&logged);

    let chain = Chain::new(|_req: Request, responder: Responder| {
        responder.respond(Response::text("Welcome to slipway!"));
    })
    .wrap(
        Trace::new()
            .with_identity(7)
            .with_sink(move |_pid, _at, _path| {
                probe.fetch_add(1, Ordering::SeqCst);
            }),
    );

    let response = chain.run(Request::new(Method::Get, "/")).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body_bytes(), b"Welcome to slipway!");
    assert_eq!(logged.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn deferred_handler_success_path() {
    let chain = Chain::new(deferred_fibo(10));
    let response = chain.run(Request::new(Method::Get, "/fibo")).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body_bytes(), b"result is 55");
}

#[tokio::test]
async fn deferred_handler_failure_path_responds_exactly_once() {
    let responses = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&responses);

    let chain = Chain::new(move |_req: Request, responder: Responder| {
        let future: Future<u64> = Future::compute(|| Err(TaskError::new("ledger unavailable")));
        let counter = Arc::clone(&probe);
        let on_error = responder.clone();
        Promise::from_future(future)
            .then(move |n| responder.respond(Response::text(format!("result is {n}"))))
            .failure(move |e| {
                counter.fetch_add(1, Ordering::SeqCst);
                on_error.respond(
                    Response::builder()
                        .status(Status::InternalServerError)
                        .text(e.to_string()),
                );
            });
    });

    let response = chain.run(Request::new(Method::Get, "/fibo")).await;
    assert_eq!(response.status_code(), 500);
    assert_eq!(response.body_bytes(), b"ledger unavailable");
    assert_eq!(responses.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_work_surfaces_as_500_response() {
    let chain = Chain::new(|_req: Request, responder: Responder| {
        let future: Future<u64> = Future::new(|_completion| panic!("index out of range"));
        let on_error = responder.clone();
        Promise::from_future(future)
            .then(move |n| responder.respond(Response::text(n.to_string())))
            .failure(move |e| {
                on_error.respond(
                    Response::builder()
                        .status(Status::InternalServerError)
                        .text(e.to_string()),
                );
            });
    });

    let response = chain.run(Request::new(Method::Get, "/boom")).await;
    assert_eq!(response.status_code(), 500);
    assert_eq!(response.body_bytes(), b"index out of range");
}

#[tokio::test]
async fn concurrent_requests_keep_their_own_settlements() {
    let chain_a = Chain::new(deferred_fibo(10));
    let chain_b = Chain::new(deferred_fibo(12));

    let (a, b) = tokio::join!(
        chain_a.run(Request::new(Method::Get, "/fibo")),
        chain_b.run(Request::new(Method::Get, "/fibo")),
    );

    assert_eq!(a.body_bytes(), b"result is 55");
    assert_eq!(b.body_bytes(), b"result is 144");
}

#[tokio::test]
async fn unhandled_rejection_does_not_hang_the_request() {
    // No failure sink: the rejected chain drops the parked responder and the
    // driver falls back to a default 500 instead of waiting forever.
    let chain = Chain::new(|_req: Request, responder: Responder| {
        let future: Future<u64> = Future::compute(|| Err(TaskError::new("lost")));
        Promise::from_future(future)
            .then(move |n| responder.respond(Response::text(n.to_string())));
    })
    .deadline(Duration::from_secs(5));

    let response = chain.run(Request::new(Method::Get, "/")).await;
    assert_eq!(response.status_code(), 500);
}

#[tokio::test]
async fn middleware_short_circuit_precedes_deferred_handler() {
    let handler_hits = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&handler_hits);

    let chain = Chain::new(move |req: Request, responder: Responder| {
        probe.fetch_add(1, Ordering::SeqCst);
        deferred_fibo(10)(req, responder);
    })
    .wrap(|req: Request, next: Next, responder: Responder| {
        // Asset interceptor: answer known paths directly, forward the rest.
        if req.path().starts_with("/assets/") {
            responder.respond(Response::text("asset bytes"));
        } else {
            next.respond(req, responder);
        }
    });

    let asset = chain.run(Request::new(Method::Get, "/assets/app.css")).await;
    assert_eq!(asset.body_bytes(), b"asset bytes");
    assert_eq!(handler_hits.load(Ordering::SeqCst), 0);

    let page = chain.run(Request::new(Method::Get, "/fibo")).await;
    assert_eq!(page.body_bytes(), b"result is 55");
    assert_eq!(handler_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn double_respond_keeps_the_first_response() {
    let chain = Chain::new(|_req: Request, responder: Responder| {
        responder.respond(Response::text("first"));
        responder.respond(Response::text("second"));
    });

    let response = chain.run(Request::new(Method::Get, "/")).await;
    assert_eq!(response.body_bytes(), b"first");
}
