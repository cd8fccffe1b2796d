//! Single-resolution call futures.
//!
//! A `CallFuture` resolves exactly once with a value or an error, driven by
//! its `CallPromise` counterpart from whatever task performs the work. The
//! promise is consumed by resolution, so a second transition is impossible;
//! dropping an unresolved promise rejects the future.

use crate::error::{Result, SwitchboardError};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Future half of a single-resolution pair.
///
/// Pending until the promise acts: resolution yields `Ok`, rejection yields
/// `Err`. A promise dropped unresolved yields
/// [`SwitchboardError::BrokenPromise`].
pub struct CallFuture<T> {
    rx: oneshot::Receiver<Result<T>>,
}

/// Promise half of a single-resolution pair.
///
/// Consumed by [`resolve`](CallPromise::resolve) or
/// [`reject`](CallPromise::reject); ownership makes a second transition
/// unrepresentable.
pub struct CallPromise<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> CallFuture<T> {
    /// Create a linked promise/future pair.
    pub fn pair() -> (CallPromise<T>, CallFuture<T>) {
        let (tx, rx) = oneshot::channel();
        (CallPromise { tx }, CallFuture { rx })
    }
}

impl<T: Send + 'static> CallFuture<T> {
    /// Chain a continuation onto resolution.
    ///
    /// Returns a future for `f`'s result. The continuation runs on a spawned
    /// task once the source resolves, never inline with registration.
    /// Rejection skips the continuation and propagates to the returned
    /// future.
    pub fn then<U, F>(self, f: F) -> CallFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let (promise, future) = CallFuture::pair();
        tokio::spawn(async move {
            match self.await {
                Ok(value) => promise.resolve(f(value)),
                Err(e) => promise.reject(e),
            }
        });
        future
    }
}

impl<T> Future for CallFuture<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(SwitchboardError::BrokenPromise)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> CallPromise<T> {
    /// Resolve the future with `value`.
    ///
    /// A no-op if the future side has already been dropped.
    pub fn resolve(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    /// Reject the future with `error`.
    pub fn reject(self, error: SwitchboardError) {
        let _ = self.tx.send(Err(error));
    }
}
