//! Per-write completion handle.
//!
//! A [`Status`] is the join point between the producer that called
//! [`Writable::write`](crate::Writable::write) and the consumer that later
//! calls [`Operation::complete`](crate::Operation::complete) or
//! [`Operation::error`](crate::Operation::error) on the dequeued operation.
//! It's heap-allocated (`Rc`-shared) because its lifetime routinely
//! outlives the queued operation it's attached to — the operation is
//! dequeued and dropped well before the reader gets around to resolving
//! its status.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::error::OpStreamError;
use crate::notify::Signal;

/// Lifecycle of a [`Status`]. Starts at `Waiting`; the reader advances it
/// to exactly one terminal variant, or a reader-side `cancel` forces it to
/// `Cancelled` regardless of which data op it was attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusState {
    /// Not yet resolved.
    Waiting,
    /// The reader called `complete` on the corresponding operation.
    Completed,
    /// The reader called `error` on the corresponding operation.
    Errored,
    /// The reader side was cancelled while this status was still waiting.
    Cancelled,
}

struct Inner<T> {
    state: Cell<StatusState>,
    result: RefCell<Option<T>>,
    signal: Signal,
}

/// Handle returned by [`Writable::write`](crate::Writable::write), tracking
/// that write's eventual completion.
pub struct Status<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Status<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                state: Cell::new(StatusState::Waiting),
                result: RefCell::new(None),
                signal: Signal::new(),
            }),
        }
    }

    /// The sentinel status attached to `close`/`abort`/`cancel` operations.
    /// Nothing ever awaits it; it exists only so every [`Operation`](crate::Operation)
    /// can go through the same `complete`/`error` plumbing.
    pub(crate) fn sentinel() -> Self {
        Self::new()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StatusState {
        self.inner.state.get()
    }

    /// The value supplied at the terminal transition, if any. `None` both
    /// before resolution and for a `close` operation's sentinel status,
    /// which resolves without a carried value.
    pub fn result(&self) -> Ref<'_, Option<T>> {
        self.inner.result.borrow()
    }

    /// Resolves once `state()` is no longer [`StatusState::Waiting`].
    pub async fn ready(&self) -> StatusState {
        self.inner
            .signal
            .until(|| self.inner.state.get() != StatusState::Waiting)
            .await;
        self.inner.state.get()
    }

    pub(crate) fn complete(&self, result: Option<T>) -> Result<(), OpStreamError> {
        self.transition(StatusState::Completed, result)
    }

    pub(crate) fn error(&self, reason: T) -> Result<(), OpStreamError> {
        self.transition(StatusState::Errored, Some(reason))
    }

    /// Forced by a reader-side `cancel`; unlike `complete`/`error` this
    /// never fails even if called twice, since cancellation may race a
    /// pipe engine that is simultaneously draining the same status.
    pub(crate) fn force_cancel(&self, reason: T) {
        if self.inner.state.get() == StatusState::Waiting {
            *self.inner.result.borrow_mut() = Some(reason);
            self.inner.state.set(StatusState::Cancelled);
            self.inner.signal.notify_all();
        }
    }

    fn transition(&self, state: StatusState, value: Option<T>) -> Result<(), OpStreamError> {
        if self.inner.state.get() != StatusState::Waiting {
            return Err(OpStreamError::Precondition(
                "status already resolved (complete/error called twice)",
            ));
        }
        *self.inner.result.borrow_mut() = value;
        self.inner.state.set(state);
        self.inner.signal.notify_all();
        Ok(())
    }
}

impl<T> Clone for Status<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Status<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Status")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
