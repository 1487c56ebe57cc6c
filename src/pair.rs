//! The operation-stream pair: one shared queue, a writable half and a
//! readable half, coupled through window-based backpressure.
//!
//! The pair is owned by a single `Rc<Inner<T>>`; [`Writable`] and
//! [`Readable`] are lightweight cloneable views over it, the same way
//! `PBufWr`/`PBufRd` are views over a shared `PipeBuf` — except here the
//! sharing is by `Rc` rather than by reborrowed `&mut`, because the two
//! halves are meant to live on opposite sides of a pipe and be polled
//! independently rather than threaded through one call stack.
//! `Rc`/`Cell`/`RefCell` rather than `Arc`/`Mutex` is deliberate: the
//! execution model is single-threaded cooperative, so there is nothing to
//! synchronize across threads.

use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::OpStreamError;
use crate::notify::Signal;
use crate::op::{OpKind, Operation};
use crate::status::Status;
use crate::strategy::Strategy;

/// Writable-side lifecycle. See the crate-level state diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WritableState {
    /// No backpressure currently reported.
    Writable,
    /// Backpressure asserted by the strategy.
    Waiting,
    /// Terminal: `close()` was called.
    Closed,
    /// Terminal: `abort()` was called.
    Aborted,
    /// Terminal: the readable side called `cancel`.
    Cancelled,
}

impl WritableState {
    fn is_terminal(self) -> bool {
        matches!(
            self,
            WritableState::Closed | WritableState::Aborted | WritableState::Cancelled
        )
    }
}

/// Readable-side lifecycle. See the crate-level state diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadableState {
    /// Queue is empty; nothing to read.
    Waiting,
    /// Queue is non-empty; `read()` will return immediately.
    Readable,
    /// Terminal: a `close` operation was dequeued.
    Drained,
    /// Terminal: the reader called `cancel`.
    Cancelled,
    /// Terminal: an `abort` operation was dequeued.
    Aborted,
}

struct QueueEntry<T> {
    op: Operation<T>,
    size: usize,
}

struct Inner<T> {
    strategy: Box<dyn Strategy<T>>,
    queue: RefCell<VecDeque<QueueEntry<T>>>,
    queue_size: Cell<usize>,
    terminal_enqueued: Cell<bool>,
    window: Cell<usize>,
    w_state: Cell<WritableState>,
    r_state: Cell<ReadableState>,
    signal: Signal,
    abort_reason: RefCell<Option<T>>,
    cancel_reason: RefCell<Option<T>>,
}

impl<T> Inner<T> {
    fn recompute_writable(&self) {
        let bp = self
            .strategy
            .should_apply_backpressure(self.queue_size.get());
        match (self.w_state.get(), bp) {
            (WritableState::Writable, true) => self.w_state.set(WritableState::Waiting),
            (WritableState::Waiting, false) => self.w_state.set(WritableState::Writable),
            _ => {}
        }
    }

    fn mark_readable_if_nonempty(&self) {
        if self.r_state.get() == ReadableState::Waiting && !self.queue.borrow().is_empty() {
            self.r_state.set(ReadableState::Readable);
        }
    }
}

/// Create a fresh operation-stream pair driven by `strategy`.
///
/// There is no `null`/`undefined` strategy in Rust's type system — pass
/// [`crate::NoBackpressure`] for the equivalent "never applies
/// backpressure" behavior; the type system makes that choice explicit
/// instead of implicit.
pub fn operation_stream<T: Clone + 'static>(
    strategy: impl Strategy<T> + 'static,
) -> (Writable<T>, Readable<T>) {
    let inner = Rc::new(Inner {
        strategy: Box::new(strategy),
        queue: RefCell::new(VecDeque::new()),
        queue_size: Cell::new(0),
        terminal_enqueued: Cell::new(false),
        window: Cell::new(0),
        w_state: Cell::new(WritableState::Writable),
        r_state: Cell::new(ReadableState::Waiting),
        signal: Signal::new(),
        abort_reason: RefCell::new(None),
        cancel_reason: RefCell::new(None),
    });
    (
        Writable {
            inner: inner.clone(),
        },
        Readable { inner },
    )
}

/// The producer half of an operation-stream pair.
pub struct Writable<T> {
    inner: Rc<Inner<T>>,
}

impl<T: Clone + 'static> Writable<T> {
    /// Current writable-side state.
    pub fn state(&self) -> WritableState {
        self.inner.w_state.get()
    }

    /// Delegates to the strategy's `space`, if it implements one.
    pub fn space(&self) -> Option<usize> {
        self.inner.strategy.space(self.inner.queue_size.get())
    }

    /// Resolves once this side's state leaves [`WritableState::Waiting`].
    pub async fn ready(&self) {
        self.inner
            .signal
            .until(|| self.inner.w_state.get() != WritableState::Waiting)
            .await;
    }

    /// Resolves once the readable side calls [`Readable::cancel`].
    pub async fn cancelled(&self) {
        self.inner
            .signal
            .until(|| self.inner.w_state.get() == WritableState::Cancelled)
            .await;
    }

    /// The reason passed to the reader's `cancel`, once this side has
    /// reached [`WritableState::Cancelled`]; `None` otherwise.
    pub fn cancel_reason(&self) -> Ref<'_, Option<T>> {
        self.inner.cancel_reason.borrow()
    }

    /// Enqueue a `data` operation carrying `arg`.
    ///
    /// Permitted even while `state()` is `Waiting` — backpressure here is
    /// advisory; a producer that ignores it simply grows the queue.
    ///
    /// # Errors
    /// Fails if this side has reached a terminal state.
    pub fn write(&self, arg: T) -> Result<Status<T>, OpStreamError> {
        match self.inner.w_state.get() {
            WritableState::Writable | WritableState::Waiting => {}
            _ => return Err(OpStreamError::Precondition("write on a non-writable side")),
        }
        let size = self.inner.strategy.size(&arg);
        let status = Status::new();
        self.inner.queue.borrow_mut().push_back(QueueEntry {
            op: Operation::new(OpKind::Data, Some(arg), status.clone()),
            size,
        });
        self.inner
            .queue_size
            .set(self.inner.queue_size.get() + size);
        self.inner.recompute_writable();
        self.inner.mark_readable_if_nonempty();
        self.inner.signal.notify_all();
        tracing::trace!(target: "opstream", new_state = ?self.inner.w_state.get(), "write");
        Ok(status)
    }

    /// Enqueue a normal end-of-stream. No more writes are permitted after
    /// this.
    ///
    /// # Errors
    /// Fails if this side has already reached a terminal state.
    pub fn close(&self) -> Result<(), OpStreamError> {
        match self.inner.w_state.get() {
            WritableState::Writable | WritableState::Waiting => {}
            _ => return Err(OpStreamError::Precondition("close on a non-writable side")),
        }
        self.inner.queue.borrow_mut().push_back(QueueEntry {
            op: Operation::new(OpKind::Close, None, Status::sentinel()),
            size: 0,
        });
        self.inner.terminal_enqueued.set(true);
        self.inner.w_state.set(WritableState::Closed);
        self.inner.mark_readable_if_nonempty();
        self.inner.signal.notify_all();
        tracing::debug!(target: "opstream", "close");
        Ok(())
    }

    /// Drop all queued `data` operations, error their still-waiting
    /// statuses with `reason`, and enqueue a single `abort` operation
    /// carrying `reason` in place of whatever was queued.
    ///
    /// # Errors
    /// Fails if this side has already reached a terminal state.
    pub fn abort(&self, reason: T) -> Result<(), OpStreamError> {
        if self.inner.w_state.get().is_terminal() {
            return Err(OpStreamError::Precondition(
                "abort on an already-terminal side",
            ));
        }
        let dropped = std::mem::take(&mut *self.inner.queue.borrow_mut());
        for entry in dropped {
            if entry.op.status().state() == crate::status::StatusState::Waiting {
                let _ = entry.op.error(reason.clone());
            }
        }
        self.inner.queue_size.set(0);
        self.inner.queue.borrow_mut().push_back(QueueEntry {
            op: Operation::new(OpKind::Abort, Some(reason), Status::sentinel()),
            size: 0,
        });
        self.inner.terminal_enqueued.set(true);
        self.inner.w_state.set(WritableState::Aborted);
        self.inner.mark_readable_if_nonempty();
        self.inner.signal.notify_all();
        tracing::debug!(target: "opstream", "abort");
        Ok(())
    }
}

/// The consumer half of an operation-stream pair.
pub struct Readable<T> {
    inner: Rc<Inner<T>>,
}

impl<T: Clone + 'static> Readable<T> {
    /// Current readable-side state.
    pub fn state(&self) -> ReadableState {
        self.inner.r_state.get()
    }

    /// Look at the kind of the head operation without dequeuing it. Used
    /// by the pipe engine to decide whether it can forward the head op
    /// right now without losing it if the decision is "not yet".
    pub fn peek_kind(&self) -> Option<OpKind> {
        self.inner.queue.borrow().front().map(|e| e.op.kind())
    }

    /// Currently advertised window (last value passed to [`Readable::set_window`]).
    pub fn window(&self) -> usize {
        self.inner.window.get()
    }

    /// Advertise a new window to the strategy, which may flip the
    /// writable side's backpressure state in either direction (a larger
    /// window can relieve it; a smaller one can newly assert it).
    ///
    /// Setting the window to its current value is a no-op: the strategy
    /// is re-invoked, but the resulting backpressure decision, if
    /// unchanged, produces no externally observable transition.
    ///
    /// # Errors
    /// Fails if this side has reached a terminal state.
    pub fn set_window(&self, window: usize) -> Result<(), OpStreamError> {
        match self.inner.r_state.get() {
            ReadableState::Waiting | ReadableState::Readable => {}
            _ => return Err(OpStreamError::Precondition("set_window on a terminal side")),
        }
        self.inner.window.set(window);
        self.inner.strategy.on_window_update(window);
        self.inner.recompute_writable();
        self.inner.signal.notify_all();
        Ok(())
    }

    /// Resolves once this side's state becomes [`ReadableState::Readable`]
    /// (only meaningful to await while `state()` is `Waiting`).
    pub async fn ready(&self) {
        self.inner
            .signal
            .until(|| self.inner.r_state.get() != ReadableState::Waiting)
            .await;
    }

    /// Resolves once an `abort` operation has been dequeued.
    pub async fn errored(&self) -> Option<T> {
        self.inner
            .signal
            .until(|| self.inner.r_state.get() == ReadableState::Aborted)
            .await;
        self.abort_reason()
    }

    /// The reason carried by the dequeued `abort` operation, once
    /// `state()` is [`ReadableState::Aborted`]; `None` otherwise.
    pub fn abort_reason(&self) -> Option<T> {
        self.inner.abort_reason.borrow().clone()
    }

    /// Dequeue the head operation.
    ///
    /// # Errors
    /// Fails unless `state()` is [`ReadableState::Readable`].
    pub fn read(&self) -> Result<Operation<T>, OpStreamError> {
        if self.inner.r_state.get() != ReadableState::Readable {
            return Err(OpStreamError::Precondition("read while not readable"));
        }
        let entry = self
            .inner
            .queue
            .borrow_mut()
            .pop_front()
            .expect("readable state implies a non-empty queue");

        match entry.op.kind() {
            OpKind::Close => {
                self.inner.r_state.set(ReadableState::Drained);
            }
            OpKind::Abort => {
                *self.inner.abort_reason.borrow_mut() = entry.op.argument().cloned();
                self.inner.r_state.set(ReadableState::Aborted);
            }
            OpKind::Data => {
                self.inner
                    .queue_size
                    .set(self.inner.queue_size.get() - entry.size);
                if self.inner.queue.borrow().is_empty() {
                    self.inner.r_state.set(ReadableState::Waiting);
                }
                self.inner.recompute_writable();
            }
            OpKind::Cancel => unreachable!("Cancel is never enqueued"),
        }
        self.inner.signal.notify_all();
        tracing::trace!(target: "opstream", kind = ?entry.op.kind(), "read");
        Ok(entry.op)
    }

    /// Discard the queue, error every still-waiting `data` status with
    /// `reason`, and mark the writable side cancelled.
    ///
    /// Absorbing: once this side reaches [`ReadableState::Cancelled`], no
    /// further mutator on either half succeeds.
    ///
    /// # Errors
    /// Fails if this side has already reached a terminal state.
    pub fn cancel(&self, reason: T) -> Result<(), OpStreamError> {
        match self.inner.r_state.get() {
            ReadableState::Waiting | ReadableState::Readable => {}
            _ => {
                return Err(OpStreamError::Precondition(
                    "cancel on an already-terminal side",
                ))
            }
        }
        let dropped = std::mem::take(&mut *self.inner.queue.borrow_mut());
        for entry in dropped {
            if let OpKind::Data = entry.op.kind() {
                entry.op.status().force_cancel(reason.clone());
            }
        }
        self.inner.queue_size.set(0);
        *self.inner.cancel_reason.borrow_mut() = Some(reason);
        self.inner.w_state.set(WritableState::Cancelled);
        self.inner.r_state.set(ReadableState::Cancelled);
        self.inner.signal.notify_all();
        tracing::debug!(target: "opstream", "cancel");
        Ok(())
    }
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for Readable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}
