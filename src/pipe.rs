//! The pipe engine: couples a readable half to a writable half until one
//! side terminates.
//!
//! A cooperative loop rather than callback chaining: the loop body is a
//! plain `async fn`, and the one place it actually suspends
//! ([`wait_for_progress`]) is a hand-rolled race over whichever one-shot
//! notifications are currently meaningful to wait on — no executor,
//! spawning, or `Send` bound required, keeping this executor-agnostic the
//! same way `PBufRd::forward` is a synchronous call that lets the caller
//! supply the scheduling loop rather than pulling in an async runtime.
//!
//! Only one downstream write is kept in flight at a time: the engine
//! writes, then awaits that write's completion before forwarding the next
//! operation. A design that pipelines multiple outstanding writes would
//! need a dynamically-sized set of pending links (a `FuturesUnordered`);
//! nothing tested against this engine requires that overlap, so the
//! simpler one-at-a-time engine is what's implemented here — see
//! `DESIGN.md` for the tradeoff.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::op::OpKind;
use crate::pair::{Readable, ReadableState, Writable, WritableState};
use crate::status::StatusState;

/// Couple `src` to `dst`, forwarding `data`/`close`/`abort` in one
/// direction and `cancel` in the other, until either side reaches a
/// terminal state.
///
/// Returns once the pipe has terminated. Does not return a value — all
/// observable outcomes live on `src`/`dst`'s state and on the individual
/// [`Status`](crate::Status) handles produced along the way.
pub async fn pipe_operation_streams<T: Clone + 'static>(src: Readable<T>, dst: Writable<T>) {
    loop {
        // Rules 2 and 3 preempt rule 1 unconditionally: a cancelled `dst`
        // or an aborted `src` must terminate the pipe even when `src`
        // also has a `Data` op queued that rule 1 can't currently forward
        // (e.g. `dst` is `Cancelled`, so it's neither `Writable` nor
        // `Waiting`). Checking these only in an `else if` after rule 1
        // let a stuck rule 1 fall through to `wait_for_progress` with
        // nothing left to wait on but an already-true `src.ready()`,
        // spinning the loop forever instead of terminating.
        if dst.state() == WritableState::Cancelled {
            let reason = dst.cancel_reason().clone();
            if let Some(reason) = reason {
                let _ = src.cancel(reason);
            }
            return;
        }
        if src.state() == ReadableState::Aborted {
            if let Some(reason) = src.abort_reason() {
                let _ = dst.abort(reason);
            }
            return;
        }

        if src.state() == ReadableState::Readable {
            let kind = src
                .peek_kind()
                .expect("readable state implies a queued head operation");

            match kind {
                OpKind::Data => {
                    if !matches!(dst.state(), WritableState::Writable | WritableState::Waiting) {
                        // Can't accept right now; leave it queued and fall
                        // through to the wait below.
                    } else {
                        let op = src.read().expect("state was just observed as readable");
                        let upstream_status = op.status().clone();
                        let arg = op
                            .into_argument()
                            .expect("a Data operation always carries an argument");
                        let downstream_status = dst
                            .write(arg)
                            .expect("dst state was just checked as writable/waiting");

                        match downstream_status.ready().await {
                            StatusState::Completed => {
                                let result = downstream_status.result().clone();
                                let _ = upstream_status.complete(result);
                            }
                            StatusState::Errored | StatusState::Cancelled => {
                                let reason = downstream_status
                                    .result()
                                    .clone()
                                    .expect("an errored/cancelled status always carries a reason");
                                let _ = upstream_status.error(reason);
                            }
                            StatusState::Waiting => unreachable!("ready() only resolves on exit from Waiting"),
                        }
                        continue;
                    }
                }
                OpKind::Close => {
                    let op = src.read().expect("state was just observed as readable");
                    let _ = dst.close();
                    let _ = op.complete(None);
                    return;
                }
                OpKind::Abort => {
                    let op = src.read().expect("state was just observed as readable");
                    if let Some(reason) = op.into_argument() {
                        let _ = dst.abort(reason);
                    }
                    return;
                }
                OpKind::Cancel => unreachable!("Cancel is never queued"),
            }
        }

        wait_for_progress(&src, &dst).await;
    }
}

/// Rule 4: wait on the union of `src.ready`, `dst.ready` (only meaningful
/// while `dst` is actually `Waiting`), and `dst.cancelled` (only
/// meaningful while `dst` hasn't yet reached a terminal state) — the
/// conditional inclusion matters: racing an already-resolved future (e.g.
/// `dst.ready()` while `dst` was never `Waiting` to begin with) would spin
/// the loop without ever actually blocking.
async fn wait_for_progress<T: Clone + 'static>(src: &Readable<T>, dst: &Writable<T>) {
    let mut futs: Vec<Pin<Box<dyn Future<Output = ()> + '_>>> = vec![Box::pin(src.ready())];

    if dst.state() == WritableState::Waiting {
        futs.push(Box::pin(dst.ready()));
    }
    if matches!(dst.state(), WritableState::Writable | WritableState::Waiting) {
        futs.push(Box::pin(dst.cancelled()));
    }

    race(futs).await
}

/// Resolve as soon as any one of `futs` resolves; the rest are dropped.
async fn race(mut futs: Vec<Pin<Box<dyn Future<Output = ()> + '_>>>) {
    std::future::poll_fn(move |cx: &mut Context<'_>| {
        for fut in futs.iter_mut() {
            if fut.as_mut().poll(cx).is_ready() {
                return Poll::Ready(());
            }
        }
        Poll::Pending
    })
    .await
}
