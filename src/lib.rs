//! [![license:MIT/Apache-2.0][1]](https://example.com/opstream)&nbsp;
//! [![crates.io:opstream][3]](https://crates.io/crates/opstream)&nbsp;
//! [![docs.rs:opstream][4]](https://docs.rs/opstream)
//!
//! [1]: https://img.shields.io/badge/license-MIT%2FApache--2.0-blue
//! [3]: https://img.shields.io/badge/crates.io-opstream-red
//! [4]: https://img.shields.io/badge/docs.rs-opstream-purple
//!
//! Bidirectional operation-stream primitive with flow control and piping
//!
//! An [`operation_stream`] pair is a single-producer/single-consumer
//! channel carrying discrete operations — `data`, `close`, or `abort` —
//! from a [`Writable`] half to a [`Readable`] half, with window-based
//! backpressure and per-write completion acknowledgement. It is the
//! foundational primitive underneath higher-level readable/writable
//! stream abstractions, the way [`PipeBuf`](https://docs.rs/pipebuf) sits
//! underneath protocol-specific byte-stream glue code, except this crate's
//! queue carries typed operations with their own completion lifecycle
//! rather than raw bytes.
//!
//! Get a pair with [`operation_stream`], passing a [`Strategy`] that
//! decides how big each item is and when to report backpressure:
//!
//! ```
//! use opstream::{operation_stream, ApplyBackpressureWhenNonEmpty};
//!
//! # futures::executor::block_on(async {
//! let (wos, ros) = operation_stream::<&'static str>(ApplyBackpressureWhenNonEmpty);
//! let status = wos.write("hello").unwrap();
//! let op = ros.read().unwrap();
//! assert_eq!(op.argument(), Some(&"hello"));
//! op.complete(Some("world")).unwrap();
//! assert_eq!(*status.result(), Some("world"));
//! # });
//! ```
//!
//! From the producer side, [`Writable::write`] enqueues a `data` operation
//! and returns a [`Status`] handle the caller can poll or `.await` for
//! completion. [`Writable::close`] and [`Writable::abort`] each enqueue a
//! single terminal operation, after which no more writes are accepted.
//!
//! From the consumer side, [`Readable::read`] dequeues the head operation.
//! The consumer is expected to call [`Operation::complete`] or
//! [`Operation::error`] on it, which resolves the [`Status`] the producer
//! is holding. [`Readable::cancel`] discards whatever is queued and forces
//! every still-waiting status to `cancelled`.
//!
//! [`pipe_operation_streams`] couples a [`Readable`] half to a [`Writable`]
//! half, forwarding data/close/abort in one direction and cancel in the
//! other, and linking each upstream operation's completion to its
//! downstream counterpart.
//!
//! Like the producer/consumer split in a byte-stream pipe buffer, this has
//! similar characteristics to one half of a TCP stream: data arrives in
//! discrete chunks not aligned to any larger structure, and end-of-stream
//! is distinguished between a normal close and an abnormal abort.

mod error;
mod facade;
mod notify;
mod op;
mod pair;
mod pipe;
mod strategy;
mod status;

pub use error::OpStreamError;
pub use facade::{ReadableStream, StreamReader};
pub use op::{OpKind, Operation};
pub use pair::{operation_stream, Readable, ReadableState, Writable, WritableState};
pub use pipe::pipe_operation_streams;
pub use status::{Status, StatusState};
pub use strategy::{Adjustable, ApplyBackpressureWhenNonEmpty, NoBackpressure, Strategy};
