//! FIFO ordering and backpressure-state invariants, checked against a
//! reference model over randomly interleaved write/read/complete
//! sequences.

use opstream::{operation_stream, Adjustable, ReadableState, WritableState};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Step {
    Write(u32),
    Read,
}

fn steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            (0u32..1000).prop_map(Step::Write),
            Just(Step::Read),
        ],
        0..64,
    )
}

proptest! {
    /// `read().argument()` observes values in write order, ignoring reads
    /// attempted while nothing is queued.
    #[test]
    fn fifo_order_is_preserved(steps in steps()) {
        let (wos, ros) = operation_stream::<u32>(Adjustable::new(4, |_: &u32| 1));
        let mut written = Vec::new();
        let mut observed = Vec::new();

        for step in steps {
            match step {
                Step::Write(v) => {
                    if wos.write(v).is_ok() {
                        written.push(v);
                    }
                }
                Step::Read => {
                    if ros.state() == ReadableState::Readable {
                        let op = ros.read().unwrap();
                        if let Some(v) = op.argument() {
                            observed.push(*v);
                        }
                        let _ = op.complete(None);
                    }
                }
            }
        }

        // Drain whatever's left so the reference model sees everything
        // that was ever written.
        while ros.state() == ReadableState::Readable {
            let op = ros.read().unwrap();
            if let Some(v) = op.argument() {
                observed.push(*v);
            }
            let _ = op.complete(None);
        }

        prop_assert_eq!(observed, written);
    }

    /// `wos.state() == Writable` iff the strategy's own backpressure
    /// predicate says so, after every step.
    #[test]
    fn backpressure_matches_strategy(steps in steps()) {
        const WINDOW: usize = 4;
        let (wos, ros) = operation_stream::<u32>(Adjustable::new(WINDOW, |_: &u32| 1));
        let mut queued: usize = 0;

        for step in steps {
            match step {
                Step::Write(v) => {
                    if wos.write(v).is_ok() {
                        queued += 1;
                    }
                }
                Step::Read => {
                    if ros.state() == ReadableState::Readable {
                        let op = ros.read().unwrap();
                        let _ = op.complete(None);
                        queued -= 1;
                    }
                }
            }
            let expect_writable = queued < WINDOW;
            let is_writable = wos.state() == WritableState::Writable;
            prop_assert_eq!(is_writable, expect_writable);
        }
    }
}
