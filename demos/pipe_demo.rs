//! Buffer-pool source piped through to a byte-counting sink.
//!
//! Not part of the published crate — an external collaborator that
//! consumes the core via its public contracts only. Run with
//! `cargo run --example buffer_pool_pipe`.

#[path = "buffer_pool.rs"]
mod buffer_pool;

use std::rc::Rc;

use buffer_pool::{count_ones, pump_source, BufferPool, FakeFile, PooledBuffer, BUFFER_COUNT, FILE_SIZE};
use opstream::{operation_stream, pipe_operation_streams, Adjustable};

fn main() {
    futures::executor::block_on(async {
        let pool = BufferPool::new(BUFFER_COUNT);
        let file = FakeFile::new(FILE_SIZE);

        let (src_w, src_r) =
            operation_stream::<PooledBuffer>(Adjustable::new(BUFFER_COUNT, |_: &PooledBuffer| 1));
        let (dst_w, dst_r) =
            operation_stream::<PooledBuffer>(Adjustable::new(BUFFER_COUNT, |_: &PooledBuffer| 1));

        let pump = pump_source(Rc::clone(&pool), file, src_w);
        let pipe = pipe_operation_streams(src_r, dst_w);
        let sink = count_ones(dst_r);

        let (_, _, count) = futures::join!(pump, pipe, sink);

        assert_eq!(count, FILE_SIZE, "every byte must be counted exactly once");
        assert_eq!(
            pool.available(),
            BUFFER_COUNT,
            "every buffer must be returned to the pool"
        );
        println!(
            "S5: counted {count} bytes through the pipe; pool has {} buffers free",
            pool.available()
        );
    });
}
