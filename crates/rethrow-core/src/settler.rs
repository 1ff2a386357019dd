// SPDX-License-Identifier: MIT OR Apache-2.0
use std::error::Error;

use rethrow_error::Failure;
use tokio::sync::oneshot;

/// Errors raised by the settle handshake itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettleError {
    /// The producer dropped its [`Settler`] without resolving or rejecting.
    #[error("producer dropped its settler without settling")]
    Abandoned,
}

/// One-shot handle a producer uses to settle a
/// [`RethrowFuture`](crate::RethrowFuture).
///
/// Settling consumes the handle, so only the first settle counts.
#[derive(Debug)]
pub struct Settler<T> {
    tx: oneshot::Sender<Result<T, Failure>>,
}

impl<T> Settler<T> {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Result<T, Failure>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Succeed with `value`.
    pub fn resolve(self, value: T) {
        // The future may already be gone; nobody is left to observe it.
        let _ = self.tx.send(Ok(value));
    }

    /// Fail with `error`.
    pub fn reject<E>(self, error: E)
    where
        E: Error + Send + Sync + 'static,
    {
        let _ = self.tx.send(Err(Failure::new(error)));
    }

    /// Settle with an already built result.
    pub fn settle(self, result: Result<T, Failure>) {
        let _ = self.tx.send(result);
    }

    /// Returns `true` once the receiving future has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
