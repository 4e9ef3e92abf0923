//! The asynchronous handle returned by a start.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::cancellation::CancellationToken;
use crate::core::Payload;
use crate::errors::{Rejection, TransportError};

/// Reason given when a caller cancels a call.
pub(crate) const CALLER_CANCEL_REASON: &str = "cancelled by caller";

/// One in-flight call of a [`super::Request`].
///
/// Resolves to the last ok-pipe value or rejects with a [`Rejection`].
/// The call keeps running if this handle is dropped.
#[derive(Debug)]
pub struct Call {
    handle: CancellationToken,
    task: JoinHandle<Result<Payload, Rejection>>,
}

impl Call {
    pub(crate) const fn new(
        handle: CancellationToken,
        task: JoinHandle<Result<Payload, Rejection>>,
    ) -> Self {
        Self { handle, task }
    }

    /// The cancellation handle of this call.
    #[must_use]
    pub const fn handle(&self) -> &CancellationToken {
        &self.handle
    }

    /// Requests cancellation of this call.
    pub fn cancel(&self) {
        self.handle.cancel(CALLER_CANCEL_REASON);
    }

    /// Returns true once the call has settled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Future for Call {
    type Output = Result<Payload, Rejection>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // A handler panicked or the runtime shut down.
            Poll::Ready(Err(e)) => Poll::Ready(Err(Rejection::Error(Payload::Error(
                TransportError::other(format!("Call task failed: {e}")),
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}
