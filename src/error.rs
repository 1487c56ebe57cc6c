//! Error types surfaced by the operation-stream core.
//!
//! The core never logs, retries, or swallows an error on the caller's
//! behalf — it exposes a typed reason and lets the caller decide. See the
//! crate-level documentation for the full taxonomy this maps to.

/// Errors raised synchronously by a precondition violation.
///
/// This is the only error type the core itself produces. Strategy panics
/// are allowed to unwind rather than being converted into a value of this
/// type — see the crate-level docs for why.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OpStreamError {
    /// A mutator was called while the relevant side was in a state that
    /// does not permit it (e.g. `write` after `close`, a second `complete`
    /// on the same operation, `read` while not `readable`).
    #[error("operation-stream precondition violated: {0}")]
    Precondition(&'static str),
}
