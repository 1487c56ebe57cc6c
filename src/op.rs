//! The queued operation record.

use crate::error::OpStreamError;
use crate::status::Status;

/// The kind of a queued [`Operation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    /// Carries a content value produced by [`Writable::write`](crate::Writable::write).
    Data,
    /// Normal end-of-stream, produced by [`Writable::close`](crate::Writable::close).
    Close,
    /// Abnormal end-of-stream, produced by [`Writable::abort`](crate::Writable::abort)
    /// or a strategy/pipe failure.
    Abort,
    /// Synthesized when the reader calls [`Readable::cancel`](crate::Readable::cancel);
    /// never actually queued (cancellation discards the queue instead), but
    /// reported through the same [`OpKind`] for symmetry with the other
    /// terminal kinds.
    Cancel,
}

/// A single item dequeued from [`Readable::read`](crate::Readable::read).
///
/// `argument` carries the write's content for [`OpKind::Data`], the reason
/// for [`OpKind::Abort`]/[`OpKind::Cancel`], and is unused (`None`) for
/// [`OpKind::Close`]. The linked [`Status`] is this operation's join point
/// back to the original `write` call; for non-`Data` kinds it is a
/// sentinel that nothing observes, but `complete`/`error` remain valid to
/// call on it so callers (notably the pipe engine) don't need to special-case
/// control operations.
pub struct Operation<T> {
    kind: OpKind,
    argument: Option<T>,
    status: Status<T>,
}

impl<T> Operation<T> {
    pub(crate) fn new(kind: OpKind, argument: Option<T>, status: Status<T>) -> Self {
        Self {
            kind,
            argument,
            status,
        }
    }

    /// The operation's kind.
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Borrow the argument (content for `Data`, reason for `Abort`/`Cancel`).
    pub fn argument(&self) -> Option<&T> {
        self.argument.as_ref()
    }

    /// Take ownership of the argument, consuming the operation. Used by
    /// the pipe engine to forward a `Data` op's content downstream without
    /// cloning it.
    pub fn into_argument(self) -> Option<T> {
        self.argument
    }

    /// This operation's linked status, shared with whoever holds the
    /// `Status` returned from the original `write` call.
    pub fn status(&self) -> &Status<T> {
        &self.status
    }

    /// Advance the linked status to `completed`. `result` is `None` for a
    /// `close` operation (there is nothing to report) and `Some` for a
    /// completed `data` operation.
    ///
    /// # Errors
    /// Fails if this operation (or its linked status) was already
    /// completed/errored — each operation may be resolved at most once.
    pub fn complete(&self, result: Option<T>) -> Result<(), OpStreamError> {
        self.status.complete(result)
    }

    /// Advance the linked status to `errored` with `reason`.
    ///
    /// # Errors
    /// Fails if this operation was already resolved.
    pub fn error(&self, reason: T) -> Result<(), OpStreamError> {
        self.status.error(reason)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind)
            .field("argument", &self.argument)
            .finish()
    }
}
