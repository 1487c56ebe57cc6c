//! S6 — the same buffer-pool source consumed directly by the sink, with
//! no pipe in between.
//!
//! Run with `cargo run --example buffer_pool_direct`.

#[path = "buffer_pool.rs"]
mod buffer_pool;

use std::rc::Rc;

use buffer_pool::{count_ones, pump_source, BufferPool, FakeFile, PooledBuffer, BUFFER_COUNT, FILE_SIZE};
use opstream::{operation_stream, Adjustable};

fn main() {
    futures::executor::block_on(async {
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
        println!(
            "S6: counted {count} bytes directly; pool has {} buffers free",
            pool.available()
        );
    });
}
