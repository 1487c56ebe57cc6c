//! Shared buffer-pool source and byte-counting sink for the demo
//! binaries.
//!
//! This is an external collaborator: it consumes the core only through
//! `operation_stream`'s public contracts and is not part of the published
//! crate. A fixed-size buffer pool feeds a fake file's bytes through a
//! pair to a sink that counts bytes whose value is 1.

use std::collections::VecDeque;
use std::rc::Rc;
use std::cell::RefCell;

use opstream::{OpKind, Readable, Status, StatusState, Writable};

pub const BUFFER_COUNT: usize = 10;
pub const BUFFER_SIZE: usize = 10;
pub const FILE_SIZE: usize = 1024;

/// A leased buffer: its pool slot plus the bytes read into it.
pub struct PooledBuffer {
    pub slot: usize,
    pub bytes: Vec<u8>,
}

/// Fixed-size free-list pool. `checkout`/`release` model the rule that a
/// producer must not reuse a buffer before the matching write's status
/// reaches a terminal state.
pub struct BufferPool {
    free: RefCell<VecDeque<usize>>,
}

impl BufferPool {
    pub fn new(count: usize) -> Rc<Self> {
        Rc::new(Self {
            free: RefCell::new((0..count).collect()),
        })
    }

    pub fn checkout(&self) -> Option<usize> {
        self.free.borrow_mut().pop_front()
    }

    pub fn release(&self, slot: usize) {
        self.free.borrow_mut().push_back(slot);
    }

    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }
}

/// Yields `total` bytes in chunks of at most `BUFFER_SIZE`, alternating
/// each byte between 0 and 1 so the sink has a nontrivial count to make.
pub struct FakeFile {
    remaining: usize,
    next_byte: u8,
}

impl FakeFile {
    pub fn new(total: usize) -> Self {
        Self {
            remaining: total,
            next_byte: 0,
        }
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.remaining);
        for b in &mut buf[..n] {
            *b = self.next_byte;
            self.next_byte = if self.next_byte == 0 { 1 } else { 0 };
        }
        self.remaining -= n;
        n
    }
}

/// Drive `file` through `wos`, one buffer-sized chunk at a time, never
/// checking a buffer out of `pool` while none is free and never reusing
/// one before its write's status has resolved.
pub async fn pump_source(pool: Rc<BufferPool>, mut file: FakeFile, wos: Writable<PooledBuffer>) {
    let mut pending: VecDeque<(usize, Status<PooledBuffer>)> = VecDeque::new();

    loop {
        while let Some((slot, status)) = pending.front() {
            if status.state() != StatusState::Waiting {
                pool.release(*slot);
                pending.pop_front();
            } else {
                break;
            }
        }

        let slot = loop {
            if let Some(slot) = pool.checkout() {
                break slot;
            }
            let (slot, status) = pending
                .pop_front()
                .expect("pool exhausted implies a pending write to wait on");
            status.ready().await;
            pool.release(slot);
        };

        let mut bytes = vec![0u8; BUFFER_SIZE];
        let n = file.read_chunk(&mut bytes);
        if n == 0 {
            pool.release(slot);
            let _ = wos.close();
            break;
        }
        bytes.truncate(n);
        let status = wos
            .write(PooledBuffer { slot, bytes })
            .expect("writable side stays open for the pump's lifetime");
        pending.push_back((slot, status));
    }

    for (slot, status) in pending {
        status.ready().await;
        pool.release(slot);
    }
}

/// Counts bytes whose value is 1, reading directly off `readable`.
pub async fn count_ones(readable: Readable<PooledBuffer>) -> usize {
    use opstream::ReadableState;

    let mut count = 0usize;
    loop {
        readable.ready().await;
        match readable.state() {
            ReadableState::Readable => {
                let op = readable.read().expect("state was just observed as readable");
                match op.kind() {
                    OpKind::Data => {
                        let buf = op
                            .argument()
                            .expect("a Data operation always carries an argument");
                        count += buf.bytes.iter().filter(|&&b| b == 1).count();
                        let _ = op.complete(None);
                    }
                    _ => {
                        let _ = op.complete(None);
                        return count;
                    }
                }
            }
            ReadableState::Drained | ReadableState::Aborted | ReadableState::Cancelled => {
                return count;
            }
            ReadableState::Waiting => unreachable!("ready() only resolves out of Waiting"),
        }
    }
}
