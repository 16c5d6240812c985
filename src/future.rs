//! One-shot deferred computation.
//!
//! A [`Future`] runs a unit of work — possibly blocking or CPU-bound — on
//! tokio's blocking pool and reports exactly one outcome to registered
//! observers. It is not a `std::future::Future`; it is the callback half of
//! the pipeline's continuation model, bridged into a
//! [`Promise`](crate::Promise) when a handler wants chaining.
//!
//! # Guarantees
//!
//! - Settlement happens at most once; success and failure are mutually
//!   exclusive. The settle-once cell enforces this, not convention.
//! - Observers registered after settlement fire immediately with the stored
//!   outcome (replay) — a late `on_success` never blocks or goes missing.
//! - A panic inside the work closure, or dropping the [`Completion`] handle
//!   without settling, is a failed settlement. Work cannot leave a `Future`
//!   hanging by accident.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TaskError;

type SuccessFn<T> = Box<dyn FnOnce(T) + Send>;
type FailureFn = Box<dyn FnOnce(TaskError) + Send>;

enum State<T> {
    Pending {
        on_success: Vec<SuccessFn<T>>,
        on_failure: Vec<FailureFn>,
    },
    Settled(Result<T, TaskError>),
}

type Shared<T> = Arc<Mutex<State<T>>>;

fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, State<T>> {
    // A poisoned lock means an observer panicked mid-settlement; the state
    // itself is still coherent, so keep going.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settles with a value. No-op if already settled.
fn fulfill<T: Clone>(shared: &Shared<T>, value: T) {
    let callbacks = {
        let mut state = lock(shared);
        match &mut *state {
            State::Settled(_) => return,
            State::Pending { on_success, .. } => {
                let callbacks = std::mem::take(on_success);
                *state = State::Settled(Ok(value.clone()));
                callbacks
            }
        }
    };
    // Observers run outside the lock so they may register further observers.
    for cb in callbacks {
        cb(value.clone());
    }
}

/// Settles with an error. No-op if already settled.
fn fail_with<T>(shared: &Shared<T>, error: TaskError) {
    let callbacks = {
        let mut state = lock(shared);
        match &mut *state {
            State::Settled(_) => return,
            State::Pending { on_failure, .. } => {
                let callbacks = std::mem::take(on_failure);
                *state = State::Settled(Err(error.clone()));
                callbacks
            }
        }
    };
    for cb in callbacks {
        cb(error.clone());
    }
}

// ── Completion ────────────────────────────────────────────────────────────────

/// The single-use settlement handle passed to a [`Future`]'s work closure.
///
/// Consumed by value: the type system guarantees at most one settlement per
/// handle. Dropping it unsettled records a failure, so work that forgets to
/// report still completes the pipeline.
pub struct Completion<T: Clone + Send + 'static> {
    shared: Option<Shared<T>>,
}

impl<T: Clone + Send + 'static> Completion<T> {
    pub fn settle(mut self, outcome: Result<T, TaskError>) {
        if let Some(shared) = self.shared.take() {
            match outcome {
                Ok(value) => fulfill(&shared, value),
                Err(error) => fail_with(&shared, error),
            }
        }
    }

    pub fn succeed(self, value: T) {
        self.settle(Ok(value));
    }

    pub fn fail(self, error: TaskError) {
        self.settle(Err(error));
    }
}

impl<T: Clone + Send + 'static> Drop for Completion<T> {
    fn drop(&mut self) {
        // During a panic the catch_unwind boundary in `Future::new` records
        // the payload as the settlement; don't race it with a vaguer message.
        if std::thread::panicking() {
            return;
        }
        if let Some(shared) = self.shared.take() {
            fail_with(
                &shared,
                TaskError::new("work finished without settling its completion"),
            );
        }
    }
}

// ── Future ────────────────────────────────────────────────────────────────────

/// A one-shot asynchronous computation.
///
/// ```rust,no_run
/// use slipway::{Future, TaskError};
///
/// let future = Future::compute(|| {
///     Ok::<_, TaskError>(6 * 7)
/// });
/// future.on_success(|n| println!("result is {n}"));
/// future.on_failure(|e| eprintln!("failed: {e}"));
/// ```
///
/// Must be created from within a tokio runtime: the work closure is scheduled
/// on the blocking pool immediately.
pub struct Future<T> {
    shared: Shared<T>,
}

impl<T: Clone + Send + 'static> Future<T> {
    /// Schedules `work` on the blocking pool and returns immediately.
    ///
    /// `work` receives a [`Completion`] it must settle exactly once. A panic
    /// in `work` settles the future with the panic message.
    pub fn new(work: impl FnOnce(Completion<T>) + Send + 'static) -> Self {
        let shared: Shared<T> = Arc::new(Mutex::new(State::Pending {
            on_success: Vec::new(),
            on_failure: Vec::new(),
        }));

        let completion = Completion { shared: Some(Arc::clone(&shared)) };
        let settle_panic = Arc::clone(&shared);

        tokio::task::spawn_blocking(move || {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(move || work(completion))) {
                fail_with(&settle_panic, TaskError::from_panic(payload));
            }
        });

        Self { shared }
    }

    /// Convenience wrapper for work that computes a value and returns.
    pub fn compute(f: impl FnOnce() -> Result<T, TaskError> + Send + 'static) -> Self {
        Self::new(move |completion| completion.settle(f()))
    }

    /// Registers an observer invoked iff the future settles with a value.
    /// Fires immediately if the future already did.
    pub fn on_success(&self, f: impl FnOnce(T) + Send + 'static) {
        let replay = {
            let mut state = lock(&self.shared);
            match &mut *state {
                State::Pending { on_success, .. } => {
                    on_success.push(Box::new(f));
                    return;
                }
                State::Settled(Ok(value)) => Some(value.clone()),
                State::Settled(Err(_)) => None,
            }
        };
        if let Some(value) = replay {
            f(value);
        }
    }

    /// Registers an observer invoked iff the future settles with an error.
    /// Fires immediately if the future already did.
    pub fn on_failure(&self, f: impl FnOnce(TaskError) + Send + 'static) {
        let replay = {
            let mut state = lock(&self.shared);
            match &mut *state {
                State::Pending { on_failure, .. } => {
                    on_failure.push(Box::new(f));
                    return;
                }
                State::Settled(Err(error)) => Some(error.clone()),
                State::Settled(Ok(_)) => None,
            }
        };
        if let Some(error) = replay {
            f(error);
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(*lock(&self.shared), State::Settled(_))
    }
}
