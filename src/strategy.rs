//! Pluggable queue-sizing and backpressure policy.
//!
//! A [`Strategy`] is a capability set, not a fixed interface: every method
//! has a default, so an implementation only overrides the parts it cares
//! about. The pair treats a missing `size` as 1 per item and a missing
//! `should_apply_backpressure` as "never applies backpressure" — exactly
//! what [`NoBackpressure`] gets for free by overriding nothing.
//!
//! A panic inside a `Strategy` method is a bug in the strategy, not a
//! condition this crate catches and converts into a stream event — it
//! unwinds like any other caller bug, the same way a malformed argument to
//! [`PBufWr::commit`](https://docs.rs/pipebuf) panics rather than being
//! reported through the pipe.

use std::cell::Cell;

/// Sizing and backpressure policy for an [`operation_stream`](crate::operation_stream) pair.
pub trait Strategy<T> {
    /// Cost of queuing `arg`. Defaults to 1 (item-counting).
    fn size(&self, _arg: &T) -> usize {
        1
    }

    /// Whether the writable side should report backpressure once the
    /// queue's total size reaches `queue_size`. Defaults to `false`
    /// (never apply backpressure).
    fn should_apply_backpressure(&self, _queue_size: usize) -> bool {
        false
    }

    /// Remaining capacity, if this strategy tracks one. `None` means "not
    /// meaningful for this strategy" (distinct from `Some(0)`, full).
    fn space(&self, _queue_size: usize) -> Option<usize> {
        None
    }

    /// Called when the readable side's advertised window changes.
    fn on_window_update(&self, _window: usize) {}
}

/// Never applies backpressure; every item sizes to 1.
///
/// Equivalent to a `Strategy` with every method left at its default — kept
/// as a named type so callers don't need to write their own empty impl.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackpressure;

impl<T> Strategy<T> for NoBackpressure {}

/// Applies backpressure as soon as the queue holds anything at all —
/// "at most one in flight" semantics.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplyBackpressureWhenNonEmpty;

impl<T> Strategy<T> for ApplyBackpressureWhenNonEmpty {
    fn should_apply_backpressure(&self, queue_size: usize) -> bool {
        queue_size > 0
    }
}

/// Window-based strategy: backpressure once the queue reaches the current
/// window, `space` reports `window - queue_size` (floored at zero), and
/// [`Strategy::on_window_update`] caches a new window for future
/// evaluation.
///
/// Construct with [`Adjustable::new`] and a sizing closure, or use
/// [`Adjustable::for_bytes`]/[`Adjustable::for_str`] for the two reference
/// variants spec'd for byte buffers and strings.
pub struct Adjustable<T> {
    window: Cell<usize>,
    size_fn: Box<dyn Fn(&T) -> usize>,
}

impl<T> Adjustable<T> {
    /// Build an adjustable-window strategy with an explicit sizing function.
    pub fn new(window: usize, size_fn: impl Fn(&T) -> usize + 'static) -> Self {
        Self {
            window: Cell::new(window),
            size_fn: Box::new(size_fn),
        }
    }

    /// Current cached window.
    pub fn window(&self) -> usize {
        self.window.get()
    }
}

impl Adjustable<Vec<u8>> {
    /// Size items by byte length.
    pub fn for_bytes(window: usize) -> Self {
        Self::new(window, |b: &Vec<u8>| b.len())
    }
}

impl Adjustable<String> {
    /// Size items by (byte) string length.
    pub fn for_str(window: usize) -> Self {
        Self::new(window, |s: &String| s.len())
    }
}

impl<T> Strategy<T> for Adjustable<T> {
    fn size(&self, arg: &T) -> usize {
        (self.size_fn)(arg)
    }

    fn should_apply_backpressure(&self, queue_size: usize) -> bool {
        queue_size >= self.window.get()
    }

    fn space(&self, queue_size: usize) -> Option<usize> {
        Some(self.window.get().saturating_sub(queue_size))
    }

    fn on_window_update(&self, window: usize) {
        self.window.set(window);
    }
}
