use crate::{
    error::ScrollError,
    scroll::{publisher::ScrollSubscription, subscriber::Signal},
};
use engine_core::metrics::{Metrics, MetricsSnapshot};
use futures::{
    Stream, StreamExt,
    stream::{self, BoxStream, FusedStream},
};
use std::{
    fmt::Debug,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;

/// A scroll consumed as a `futures::Stream`.
///
/// Keeps up to `prefetch` items of demand outstanding and tops it up once half
/// has been delivered, so the actor can fetch ahead while the caller works.
/// Yields `Err` at most once, as the last element. Fused: once it has ended it
/// keeps returning `None`. Dropping the stream cancels the scroll.
pub struct ScrollStream<T> {
    inner: BoxStream<'static, Result<T, ScrollError>>,
    metrics: Metrics,
    done: bool,
}

struct Feed<T>
where
    T: Send + Debug + 'static,
{
    subscription: ScrollSubscription<T>,
    signals: mpsc::UnboundedReceiver<Signal<T>>,
    prefetch: u64,
    outstanding: u64,
}

impl<T> Feed<T>
where
    T: Send + Debug + 'static,
{
    async fn replenish(&mut self) {
        if self.outstanding > self.prefetch / 2 {
            return;
        }
        let n = self.prefetch - self.outstanding;
        self.subscription.request(n).await;
        self.outstanding += n;
    }

    async fn next(mut self) -> Option<(Result<T, ScrollError>, Option<Self>)> {
        self.replenish().await;

        match self.signals.recv().await? {
            Signal::Next(item) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                Some((Ok(item), Some(self)))
            }
            Signal::Error(error) => Some((Err(error), None)),
            Signal::Complete => None,
        }
    }
}

impl<T> ScrollStream<T>
where
    T: Send + Debug + 'static,
{
    pub(crate) fn new(
        subscription: ScrollSubscription<T>,
        signals: mpsc::UnboundedReceiver<Signal<T>>,
        prefetch: u64,
    ) -> Self {
        let metrics = subscription.metrics_handle();
        let feed = Feed {
            subscription,
            signals,
            prefetch: prefetch.max(1),
            outstanding: 0,
        };

        let inner = stream::unfold(Some(feed), |feed| async move {
            match feed {
                Some(feed) => feed.next().await,
                None => None,
            }
        })
        .boxed();

        Self {
            inner,
            metrics,
            done: false,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<T> Stream for ScrollStream<T> {
    type Item = Result<T, ScrollError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        let polled = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(None) = polled {
            self.done = true;
        }
        polled
    }
}

impl<T> FusedStream for ScrollStream<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}
