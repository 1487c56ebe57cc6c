//! High-level readable-stream façade (boundary layer only).
//!
//! A thin wrapper that adds exclusive reader locking on top of a
//! [`Readable`] half. It consumes the core only through the public
//! contracts in [`crate::pair`] and owns no additional protocol — tee, a
//! promise-returning `pipe_to` with prevent-flags, and iterator-result
//! shaping belong to a still-higher-level readable-stream type and are
//! out of scope here, same as they are for the core.
//!
//! Locking is modeled as a generation-tracked claim shared between the
//! façade and every [`StreamReader`] it hands out: only one
//! [`StreamReader`] may exist at a time. Each checked-out reader
//! remembers the generation id it was issued; releasing (explicitly or
//! via `Drop`) only clears the shared lock if that id is still the
//! active one. Without that check, a stale reader that already called
//! `release_lock` (or was dropped late) could clobber a *newer* reader's
//! lock out from under it — `r1.release_lock()`, `r2 = get_reader()`,
//! then dropping `r1` must not unlock `r2`. Unlike the full contract a
//! browser-grade `ReadableStream` would enforce, this façade does not
//! (and structurally cannot, without threading a lock flag down into
//! [`Readable`] itself) prevent a caller who still holds the original
//! [`Readable`] from reading around the lock — the core's `read`/`cancel`
//! stay unconditionally available on the half itself. The façade guards
//! against two [`StreamReader`]s fighting over the same stream, which is
//! the scenario it exists for.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::OpStreamError;
use crate::op::Operation;
use crate::pair::{Readable, ReadableState};

/// Shared lock state: `active == 0` means unlocked; any other value is
/// the generation id of the [`StreamReader`] currently holding the lock.
struct LockState {
    next_id: Cell<u64>,
    active: Cell<u64>,
}

/// A lock-aware wrapper around a [`Readable`] half.
pub struct ReadableStream<T> {
    readable: Readable<T>,
    lock: Rc<LockState>,
}

impl<T: Clone + 'static> ReadableStream<T> {
    /// Wrap an existing readable half.
    pub fn new(readable: Readable<T>) -> Self {
        Self {
            readable,
            lock: Rc::new(LockState {
                next_id: Cell::new(1),
                active: Cell::new(0),
            }),
        }
    }

    /// Whether a [`StreamReader`] is currently checked out.
    pub fn locked(&self) -> bool {
        self.lock.active.get() != 0
    }

    /// Check out the exclusive reader.
    ///
    /// # Errors
    /// Fails if a [`StreamReader`] has already been checked out and not
    /// yet released.
    pub fn get_reader(&self) -> Result<StreamReader<T>, OpStreamError> {
        if self.lock.active.get() != 0 {
            return Err(OpStreamError::Precondition(
                "readable stream is already locked to a reader",
            ));
        }
        let id = self.lock.next_id.get();
        self.lock.next_id.set(id + 1);
        self.lock.active.set(id);
        Ok(StreamReader {
            readable: self.readable.clone(),
            lock: Rc::clone(&self.lock),
            id,
        })
    }
}

/// The exclusive-access handle checked out from [`ReadableStream::get_reader`].
pub struct StreamReader<T> {
    readable: Readable<T>,
    lock: Rc<LockState>,
    id: u64,
}

impl<T: Clone + 'static> StreamReader<T> {
    /// See [`Readable::state`].
    pub fn state(&self) -> ReadableState {
        self.readable.state()
    }

    /// See [`Readable::read`].
    pub fn read(&self) -> Result<Operation<T>, OpStreamError> {
        self.readable.read()
    }

    /// See [`Readable::cancel`].
    pub fn cancel(&self, reason: T) -> Result<(), OpStreamError> {
        self.readable.cancel(reason)
    }

    /// See [`Readable::ready`].
    pub async fn ready(&self) {
        self.readable.ready().await
    }

    /// See [`Readable::errored`].
    pub async fn errored(&self) -> Option<T> {
        self.readable.errored().await
    }

    /// Release the lock early, before this reader is dropped.
    ///
    /// A no-op if this reader's generation id is no longer the active
    /// one (it already released, and a newer reader has since been
    /// checked out).
    pub fn release_lock(&self) {
        if self.lock.active.get() == self.id {
            self.lock.active.set(0);
        }
    }
}

impl<T> Drop for StreamReader<T> {
    fn drop(&mut self) {
        if self.lock.active.get() == self.id {
            self.lock.active.set(0);
        }
    }
}
