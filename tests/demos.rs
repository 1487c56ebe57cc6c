//! S5/S6 as real `cargo test` integration tests, driving the
//! buffer-pool/byte-sink collaborators in `demos/buffer_pool.rs` the same
//! way `demos/pipe_demo.rs`/`demos/direct_demo.rs` do in their `main()`s.

#[path = "../demos/buffer_pool.rs"]
mod buffer_pool;

use std::rc::Rc;

use buffer_pool::{count_ones, pump_source, BufferPool, FakeFile, PooledBuffer, BUFFER_COUNT, FILE_SIZE};
use futures::executor::block_on;
use opstream::{operation_stream, pipe_operation_streams, Adjustable};

#[test]
fn s5_buffer_pool_piped_to_sink() {
    block_on(async {
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
    });
}

#[test]
fn s6_buffer_pool_direct_to_sink() {
    block_on(async {
        let pool = BufferPool::new(BUFFER_COUNT);
        let file = FakeFile::new(FILE_SIZE);

        let (wos, ros) =
            operation_stream::<PooledBuffer>(Adjustable::new(BUFFER_COUNT, |_: &PooledBuffer| 1));

        let pump = pump_source(Rc::clone(&pool), file, wos);
        let sink = count_ones(ros);

        let (_, count) = futures::join!(pump, sink);

        assert_eq!(count, FILE_SIZE, "every byte must be counted exactly once");
        assert_eq!(
            pool.available(),
            BUFFER_COUNT,
            "every buffer must be returned to the pool"
        );
    });
}
