//! The consumer side of a running pipeline.
//!
//! A [`PageStream`] bundles the item channel with a single-shot
//! [`ErrorSlot`]. The slot is resolved before the item channel closes, so
//! draining the items and then waiting on the slot never blocks.
//!
//! Waiting on the slot *before* draining the items is a hazard: the fetch
//! workers block on the bounded channel and the slot only resolves once the
//! deadline or a cancellation stops them.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::core::{Error, Result};
use crate::pipeline::PipelineState;

/// Items produced by a pipeline, in arrival order.
pub struct ItemStream<T> {
    inner: ReceiverStream<T>,
}

impl<T> ItemStream<T> {
    fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
        }
    }

    /// Receive the next item, or `None` once the pipeline closed the stream.
    pub async fn recv(&mut self) -> Option<T> {
        self.inner.as_mut().recv().await
    }

    /// Whether the producer side has closed and every item was received.
    pub fn is_terminated(&self) -> bool {
        let rx = self.inner.as_ref();
        rx.is_closed() && rx.is_empty()
    }

    /// The underlying channel receiver
    pub fn into_inner(self) -> mpsc::Receiver<T> {
        self.inner.into_inner()
    }
}

impl<T> Stream for ItemStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// The terminal error of a pipeline run. Readable once.
pub struct ErrorSlot {
    rx: oneshot::Receiver<Option<Error>>,
}

impl ErrorSlot {
    /// Wait for the pipeline to finish and take its error, if any.
    pub async fn wait(self) -> Option<Error> {
        // A dropped sender means the orchestrator task never finalized.
        self.rx.await.unwrap_or(Some(Error::ChannelClosed))
    }

    /// Take the error without waiting. `None` means the pipeline has not
    /// finalized yet and the slot is handed back.
    pub fn try_take(mut self) -> std::result::Result<Option<Error>, Self> {
        match self.rx.try_recv() {
            Ok(error) => Ok(error),
            Err(oneshot::error::TryRecvError::Empty) => Err(self),
            Err(oneshot::error::TryRecvError::Closed) => Ok(Some(Error::ChannelClosed)),
        }
    }
}

/// Handle to a running pipeline.
pub struct PageStream<T> {
    items: ItemStream<T>,
    error: ErrorSlot,
    state: watch::Receiver<PipelineState>,
    token: CancellationToken,
}

impl<T> PageStream<T> {
    pub(crate) fn new(
        rx: mpsc::Receiver<T>,
        error_rx: oneshot::Receiver<Option<Error>>,
        state: watch::Receiver<PipelineState>,
        token: CancellationToken,
    ) -> Self {
        Self {
            items: ItemStream::new(rx),
            error: ErrorSlot { rx: error_rx },
            state,
            token,
        }
    }

    /// Receive the next item, or `None` once the stream is closed.
    pub async fn recv(&mut self) -> Option<T> {
        self.items.recv().await
    }

    /// Current orchestrator state.
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// A watcher over orchestrator state transitions.
    pub fn watch_state(&self) -> watch::Receiver<PipelineState> {
        self.state.clone()
    }

    /// Cancel this run. The error slot will carry [`Error::Cancelled`]
    /// unless another error was recorded first.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token cancelled when this run is cancelled, by the caller, the
    /// deadline or the first failing page.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Split into the item stream and the error slot.
    pub fn into_parts(self) -> (ItemStream<T>, ErrorSlot) {
        (self.items, self.error)
    }

    /// Drain every item, then return them along with the terminal error.
    ///
    /// Items delivered before an error are kept.
    pub async fn drain(self) -> (Vec<T>, Option<Error>) {
        let (mut items, error) = self.into_parts();
        let mut collected = Vec::new();
        while let Some(item) = items.recv().await {
            collected.push(item);
        }
        (collected, error.wait().await)
    }

    /// Drain every item and fail if the pipeline reported an error.
    pub async fn collect(self) -> Result<Vec<T>> {
        match self.drain().await {
            (items, None) => Ok(items),
            (_, Some(error)) => Err(error),
        }
    }

    /// Discard the remaining items and return the terminal error.
    pub async fn finish(self) -> Result<()> {
        let (mut items, error) = self.into_parts();
        while items.recv().await.is_some() {}
        match error.wait().await {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }
}

impl<T> Stream for PageStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.items).poll_next(cx)
    }
}
