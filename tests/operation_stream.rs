//! End-to-end scenarios covering a synchronous roundtrip, an asynchronous
//! roundtrip, window arithmetic under an adjustable strategy, and a pipe
//! between two string-keyed streams, with literal values checked at each
//! step.

use futures::executor::block_on;
use opstream::{
    operation_stream, pipe_operation_streams, Adjustable, ApplyBackpressureWhenNonEmpty,
    NoBackpressure, OpKind, ReadableState, StatusState, WritableState,
};

/// Routes this crate's `tracing` spans/events to the test output.
/// `try_init` so repeated calls across tests in this binary don't panic
/// on re-initializing the global subscriber.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn s1_synchronous_roundtrip() {
    init_tracing();
    let (wos, ros) = operation_stream::<&'static str>(ApplyBackpressureWhenNonEmpty);
    assert_eq!(wos.state(), WritableState::Writable);
    assert_eq!(ros.state(), ReadableState::Waiting);

    let status = wos.write("hello").unwrap();
    assert_eq!(wos.state(), WritableState::Waiting);
    assert_eq!(ros.state(), ReadableState::Readable);
    assert_eq!(status.state(), StatusState::Waiting);

    let op = ros.read().unwrap();
    assert_eq!(op.argument(), Some(&"hello"));
    assert_eq!(ros.state(), ReadableState::Waiting);
    assert_eq!(wos.state(), WritableState::Writable);
    assert_eq!(status.state(), StatusState::Waiting);

    op.complete(Some("world")).unwrap();
    assert_eq!(status.state(), StatusState::Completed);
    assert_eq!(*status.result(), Some("world"));
}

#[test]
fn s2_asynchronous_roundtrip() {
    init_tracing();
    block_on(async {
        let (wos, ros) = operation_stream::<&'static str>(ApplyBackpressureWhenNonEmpty);
        let status = wos.write("hello").unwrap();

        ros.ready().await;
        let op = ros.read().unwrap();
        assert_eq!(op.argument(), Some(&"hello"));

        op.complete(Some("world")).unwrap();
        let final_state = status.ready().await;
        assert_eq!(final_state, StatusState::Completed);
        assert_eq!(*status.result(), Some("world"));
    });
}

#[test]
fn s3_window_arithmetic() {
    init_tracing();
    let strategy = Adjustable::<Vec<u8>>::for_bytes(5);
    let (wos, ros) = operation_stream(strategy);

    ros.set_window(5).unwrap();
    assert_eq!(wos.state(), WritableState::Writable);
    assert_eq!(wos.space(), Some(5));

    ros.set_window(0).unwrap();
    let _ = wos.write(vec![0u8; 10]).unwrap();
    assert_eq!(wos.state(), WritableState::Waiting);
    assert_eq!(wos.space(), Some(0));

    ros.set_window(10).unwrap();
    assert_eq!(wos.state(), WritableState::Waiting);
    assert_eq!(wos.space(), Some(0));

    ros.set_window(15).unwrap();
    assert_eq!(wos.state(), WritableState::Writable);
    assert_eq!(wos.space(), Some(5));

    ros.set_window(20).unwrap();
    assert_eq!(wos.state(), WritableState::Writable);
    assert_eq!(wos.space(), Some(10));

    let _ = ros.read().unwrap();
    assert_eq!(wos.state(), WritableState::Writable);
    assert_eq!(wos.space(), Some(20));
}

#[test]
fn s4_pipe_with_string_strategy() {
    init_tracing();
    block_on(async {
        let (src_w, src_r) = operation_stream::<String>(Adjustable::for_str(20));
        let (dst_w, dst_r) = operation_stream::<String>(Adjustable::for_str(20));

        let hello_status = src_w.write("hello".to_string()).unwrap();
        let _world_status = src_w.write("world".to_string()).unwrap();
        src_w.close().unwrap();

        dst_r.set_window(20).unwrap();

        let pipe = pipe_operation_streams(src_r, dst_w);
        futures::pin_mut!(pipe);

        // Drive the pipe and the downstream reader in lock-step: poll the
        // pipe one step, then drain whatever that step made readable.
        // Both futures live in this single task, so a plain `.await` on
        // either one would starve the other; poll_fn-driving the pipe by
        // hand keeps this test single-threaded without deadlocking.
        let mut drained = false;
        for _ in 0..64 {
            let _ = futures::poll!(pipe.as_mut());
            while dst_r.state() == ReadableState::Readable {
                let kind = dst_r.peek_kind().unwrap();
                match kind {
                    OpKind::Data => {
                        let op = dst_r.read().unwrap();
                        if op.argument() == Some(&"hello".to_string()) {
                            op.complete(Some("hi".to_string())).unwrap();
                        } else {
                            op.complete(None).unwrap();
                        }
                    }
                    OpKind::Close => {
                        let op = dst_r.read().unwrap();
                        op.complete(None).unwrap();
                        drained = true;
                    }
                    _ => {}
                }
            }
            if drained {
                break;
            }
        }
        assert!(drained, "pipe did not drain within the step budget");

        assert_eq!(*hello_status.result(), Some("hi".to_string()));
        assert_eq!(dst_r.state(), ReadableState::Drained);
    });
}

#[test]
fn pipe_terminates_when_dst_cancelled_with_data_queued() {
    init_tracing();
    block_on(async {
        let (src_w, src_r) = operation_stream::<&'static str>(NoBackpressure);
        let (dst_w, dst_r) = operation_stream::<&'static str>(NoBackpressure);

        // Queue a Data op upstream before the downstream is cancelled, so
        // on the pipe's very first step `src` is `Readable` with a `Data`
        // op at the head *and* `dst` is already `Cancelled` — the case
        // that used to fall through rule 1 into a never-suspending wait.
        let _ = src_w.write("queued").unwrap();
        dst_r.cancel("stop").unwrap();

        let src_r_check = src_r.clone();
        let dst_w_check = dst_w.clone();

        // If rule 2 didn't preempt rule 1 here, this `.await` would never
        // return.
        pipe_operation_streams(src_r, dst_w).await;

        assert_eq!(src_r_check.state(), ReadableState::Cancelled);
        assert_eq!(dst_w_check.state(), WritableState::Cancelled);
    });
}
