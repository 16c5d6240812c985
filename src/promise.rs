//! Chainable settle-once wrapper around a single asynchronous result.
//!
//! A [`Promise`] is the handler-facing face of a deferred computation: bridge
//! a [`Future`](crate::Future) in, then chain [`then`](Promise::then) for the
//! success path and terminate with [`failure`](Promise::failure) for the
//! error path. Settlement is idempotent and continuations attached after
//! settlement replay the stored outcome — a chain can never miss its result.
//!
//! ```rust,no_run
//! use slipway::{Future, Promise, TaskError};
//!
//! let future = Future::compute(|| Ok::<_, TaskError>(55));
//! Promise::from_future(future)
//!     .then(|n| println!("result is {n}"))
//!     .failure(|e| eprintln!("{e}"));
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TaskError;
use crate::future::Future;

type ResolveFn<T> = Box<dyn FnOnce(T) + Send>;
type RejectFn = Box<dyn FnOnce(TaskError) + Send>;

enum State<T> {
    Pending {
        on_resolve: Option<ResolveFn<T>>,
        on_reject: Option<RejectFn>,
    },
    // The slot empties once the value has been handed to a continuation.
    Resolved(Option<T>),
    Rejected(TaskError),
}

/// Shared settle-once cell. Each chain link owns one; the `Resolve`/`Reject`
/// handles and upstream continuations hold clones.
struct Core<T>(Arc<Mutex<State<T>>>);

impl<T> Clone for Core<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Send + 'static> Core<T> {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(State::Pending {
            on_resolve: None,
            on_reject: None,
        })))
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// First settlement wins; anything later is a no-op.
    fn resolve(&self, value: T) {
        let fire = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { on_resolve, .. } => match on_resolve.take() {
                    Some(cb) => {
                        *state = State::Resolved(None);
                        Some((cb, value))
                    }
                    None => {
                        *state = State::Resolved(Some(value));
                        None
                    }
                },
                _ => None,
            }
        };
        if let Some((cb, value)) = fire {
            cb(value);
        }
    }

    /// First settlement wins; anything later is a no-op.
    fn reject(&self, error: TaskError) {
        let fire = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { on_reject, .. } => {
                    let cb = on_reject.take();
                    *state = State::Rejected(error.clone());
                    cb
                }
                _ => None,
            }
        };
        if let Some(cb) = fire {
            cb(error);
        }
    }

    /// Attaches the continuation pair, replaying immediately if already
    /// settled. Continuations run outside the lock.
    fn register(&self, on_resolve: ResolveFn<T>, on_reject: RejectFn) {
        let mut state = self.lock();
        match &mut *state {
            State::Pending { on_resolve: resolve_slot, on_reject: reject_slot } => {
                *resolve_slot = Some(on_resolve);
                *reject_slot = Some(on_reject);
            }
            State::Resolved(slot) => {
                if let Some(value) = slot.take() {
                    drop(state);
                    on_resolve(value);
                }
            }
            State::Rejected(error) => {
                let error = error.clone();
                drop(state);
                on_reject(error);
            }
        }
    }
}

// ── Settlement handles ────────────────────────────────────────────────────────

/// The resolving half handed to a [`Promise::new`] settle closure.
/// Consumed by value; a second resolution cannot be expressed.
pub struct Resolve<T> {
    core: Core<T>,
}

impl<T: Send + 'static> Resolve<T> {
    pub fn resolve(self, value: T) {
        self.core.resolve(value);
    }
}

/// The rejecting half handed to a [`Promise::new`] settle closure.
pub struct Reject<T> {
    core: Core<T>,
}

impl<T: Send + 'static> Reject<T> {
    pub fn reject(self, error: TaskError) {
        self.core.reject(error);
    }
}

// ── Promise ───────────────────────────────────────────────────────────────────

/// A single asynchronous result with `then`/`failure` chaining.
///
/// State machine: pending → resolved | rejected, one transition, idempotent
/// afterwards. `then` and `failure` consume the promise, so each link has at
/// most one continuation pair and the chain is strictly linear.
pub struct Promise<T> {
    core: Core<T>,
}

impl<T: Send + 'static> Promise<T> {
    /// Runs `settle` synchronously on the calling context with the two
    /// settlement handles. Whichever is invoked first — now or later, from
    /// any thread — wins.
    pub fn new(settle: impl FnOnce(Resolve<T>, Reject<T>)) -> Self {
        let core = Core::new();
        settle(Resolve { core: core.clone() }, Reject { core: core.clone() });
        Self { core }
    }

    /// An already-resolved promise.
    pub fn resolved(value: T) -> Self {
        Self::new(|resolve, _| resolve.resolve(value))
    }

    /// An already-rejected promise.
    pub fn rejected(error: TaskError) -> Self {
        Self::new(|_, reject| reject.reject(error))
    }

    /// Bridges a [`Future`]: success resolves, failure rejects.
    pub fn from_future(future: Future<T>) -> Self
    where
        T: Clone,
    {
        Self::new(|resolve, reject| {
            future.on_success(move |value| resolve.resolve(value));
            future.on_failure(move |error| reject.reject(error));
        })
    }

    /// Registers a transformation invoked only on resolution.
    ///
    /// Returns a promise that resolves with `f`'s return value. Rejection
    /// short-circuits: it propagates to the returned promise unchanged and
    /// `f` never runs. A panic inside `f` rejects the returned promise.
    pub fn then<U, F>(self, f: F) -> Promise<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let downstream = Core::new();
        let on_resolve = downstream.clone();
        let on_reject = downstream.clone();
        self.core.register(
            Box::new(move |value| {
                match catch_unwind(AssertUnwindSafe(move || f(value))) {
                    Ok(out) => on_resolve.resolve(out),
                    Err(payload) => on_resolve.reject(TaskError::from_panic(payload)),
                }
            }),
            Box::new(move |error| on_reject.reject(error)),
        );
        Promise { core: downstream }
    }

    /// Registers a side-effecting sink invoked only on rejection.
    ///
    /// Terminal in spirit: the returned promise stays rejected (no recovery
    /// into a resolved state), resolution passes through untouched. A panic
    /// inside `f` is swallowed — a logging sink must not break the chain.
    pub fn failure(self, f: impl FnOnce(TaskError) + Send + 'static) -> Promise<T> {
        let downstream = Core::new();
        let on_resolve = downstream.clone();
        let on_reject = downstream.clone();
        self.core.register(
            Box::new(move |value| on_resolve.resolve(value)),
            Box::new(move |error| {
                let for_sink = error.clone();
                let _ = catch_unwind(AssertUnwindSafe(move || f(for_sink)));
                on_reject.reject(error);
            }),
        );
        Promise { core: downstream }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    use tokio::sync::oneshot;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let c = Arc::new(AtomicUsize::new(0));
        (Arc::clone(&c), c)
    }

    #[test]
    fn then_fires_on_resolution() {
        let (tx, rx) = mpsc::channel();
        Promise::resolved(21).then(move |n| tx.send(n * 2).unwrap());
        assert_eq!(rx.recv().unwrap(), 42);
    }

    #[test]
    fn settlement_is_idempotent() {
        let (hits, probe) = counter();
        Promise::new(|resolve, reject| {
            resolve.resolve("first");
            reject.reject(TaskError::new("too late"));
        })
        .then(move |v: &'static str| {
            assert_eq!(v, "first");
            hits.fetch_add(1, Ordering::SeqCst);
        })
        .failure(|_| panic!("reject after resolve must be ignored"));
        assert_eq!(probe.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejection_skips_then_and_reaches_failure() {
        let (tx, rx) = mpsc::channel();
        Promise::<i32>::rejected(TaskError::new("bad"))
            .then(|_| panic!("success continuation on a rejected promise"))
            .failure(move |e| tx.send(e.to_string()).unwrap());
        assert_eq!(rx.recv().unwrap(), "bad");
    }

    #[test]
    fn failure_never_fires_on_resolution() {
        let (hits, probe) = counter();
        Promise::resolved(7)
            .failure(|_| panic!("failure sink on a resolved promise"))
            .then(move |n| {
                assert_eq!(n, 7);
                hits.fetch_add(1, Ordering::SeqCst);
            });
        assert_eq!(probe.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn continuation_attached_before_settlement_fires_on_settlement() {
        let (handles_tx, handles_rx) = mpsc::channel();
        let promise = Promise::new(move |resolve, reject| {
            handles_tx.send((resolve, reject)).unwrap();
        });

        let (tx, rx) = mpsc::channel();
        promise.then(move |n: u32| tx.send(n).unwrap());

        let (resolve, _reject) = handles_rx.recv().unwrap();
        resolve.resolve(99);
        assert_eq!(rx.recv().unwrap(), 99);
    }

    #[test]
    fn panic_in_then_rejects_downstream() {
        let (tx, rx) = mpsc::channel();
        Promise::resolved(1)
            .then(|_| -> i32 { panic!("continuation blew up") })
            .failure(move |e| tx.send(e.to_string()).unwrap());
        assert_eq!(rx.recv().unwrap(), "continuation blew up");
    }

    #[tokio::test]
    async fn bridges_a_future_success() {
        let (tx, rx) = oneshot::channel();
        Promise::from_future(Future::compute(|| Ok(13)))
            .then(move |n| {
                let _ = tx.send(n);
            })
            .failure(|e| panic!("unexpected rejection: {e}"));
        assert_eq!(rx.await.unwrap(), 13);
    }

    #[tokio::test]
    async fn bridges_a_future_failure() {
        let (tx, rx) = oneshot::channel();
        Promise::from_future(Future::<i32>::compute(|| Err(TaskError::new("sum overflow"))))
            .then(|_| panic!("unexpected resolution"))
            .failure(move |e| {
                let _ = tx.send(e.to_string());
            });
        assert_eq!(rx.await.unwrap(), "sum overflow");
    }
}
