//! Future-returning wrappers over the callback operations.
//!
//! These are an alternative spelling of the same work: each wrapper calls the
//! callback version and forwards its result through a oneshot channel. Drive
//! them with `LocalScheduler::spawn_local`.

use crate::error::OperationError;
use crate::ops;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use ticktock_scheduler::Scheduler;

/// Resolves with whatever the wrapped callback receives.
/// If the scheduled completion is dropped unrun it resolves to
/// [`OperationError::Abandoned`].
#[must_use = "futures do nothing unless polled"]
pub struct Deferred<T> {
    rx: oneshot::Receiver<Result<T, OperationError>>,
}

impl<T> Deferred<T> {
    fn channel() -> (oneshot::Sender<Result<T, OperationError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, OperationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(OperationError::Abandoned)))
    }
}

pub fn fetch_data_async<S>(scheduler: &S, url: &str) -> Deferred<String>
where
    S: Scheduler + ?Sized,
{
    let (tx, deferred) = Deferred::channel();
    ops::fetch_data(scheduler, url, move |result| {
        let _ = tx.send(result);
    });
    deferred
}

pub fn divide_async<S>(scheduler: &S, a: f64, b: f64) -> Deferred<f64>
where
    S: Scheduler + ?Sized,
{
    let (tx, deferred) = Deferred::channel();
    ops::divide(scheduler, a, b, move |result| {
        let _ = tx.send(result);
    });
    deferred
}

/// Resolves after `delay_ms` of logical time.
pub fn sleep<S>(scheduler: &S, delay_ms: u64) -> Deferred<()>
where
    S: Scheduler + ?Sized,
{
    let (tx, deferred) = Deferred::channel();
    scheduler.schedule_after(
        delay_ms,
        Box::new(move || {
            let _ = tx.send(Ok(()));
        }),
    );
    deferred
}
