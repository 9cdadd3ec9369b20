use crate::{
    actor::{ActorRef, messages::ScrollMsg, scroll::ScrollActor, spawn_actor},
    error::ActorError,
    scroll::{
        stream::ScrollStream,
        subscriber::{ChannelSubscriber, Subscriber},
    },
};
use engine_config::settings::ScrollSettings;
use engine_core::{
    connectors::source::ScrollSource,
    metrics::{Metrics, MetricsSnapshot},
};
use model::query::ScrollQuery;
use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, info};

/// Opens scrolls against a source, one actor per subscription.
pub struct ScrollPublisher<S>
where
    S: ScrollSource,
{
    source: Arc<S>,
    settings: ScrollSettings,
}

impl<S> Clone for ScrollPublisher<S>
where
    S: ScrollSource,
{
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<S> ScrollPublisher<S>
where
    S: ScrollSource,
{
    pub fn new(source: S, settings: ScrollSettings) -> Self {
        Self::from_arc(Arc::new(source), settings)
    }

    pub fn from_arc(source: Arc<S>, settings: ScrollSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &ScrollSettings {
        &self.settings
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Spawns a scroll for `query` that delivers to `subscriber`.
    ///
    /// The scroll is opened immediately, but nothing is emitted until the
    /// returned subscription requests items.
    pub async fn subscribe<Sub>(
        &self,
        query: ScrollQuery,
        subscriber: Sub,
    ) -> Result<ScrollSubscription<S::Item>, ActorError>
    where
        Sub: Subscriber<S::Item>,
    {
        let query = query.with_defaults(self.settings.page_size(), self.settings.keep_alive());
        let name = format!("scroll-{}", query.index);
        let metrics = Metrics::new();

        info!(
            index = %query.index,
            page_size = query.page_size,
            max_items = ?self.settings.max_items(),
            "Subscribing to scroll"
        );

        let actor = ScrollActor::new(
            self.source.clone(),
            query,
            self.settings.max_items(),
            Box::new(subscriber),
            metrics.clone(),
        );
        let (actor_ref, handle) = spawn_actor(name, self.settings.mailbox_capacity(), actor);
        actor_ref.send(ScrollMsg::Subscribe).await?;

        Ok(ScrollSubscription::new(actor_ref, handle, metrics))
    }

    /// Opens a scroll consumed as a `futures::Stream`.
    pub async fn stream(&self, query: ScrollQuery) -> Result<ScrollStream<S::Item>, ActorError> {
        let (subscriber, signals) = ChannelSubscriber::channel();
        let subscription = self.subscribe(query, subscriber).await?;
        Ok(ScrollStream::new(
            subscription,
            signals,
            self.settings.prefetch(),
        ))
    }
}

/// Downstream handle of a running scroll.
///
/// Dropping the handle cancels the scroll.
pub struct ScrollSubscription<T>
where
    T: Send + Debug + 'static,
{
    actor: ActorRef<ScrollMsg<T>>,
    handle: Option<JoinHandle<()>>,
    metrics: Metrics,
    cancelled: AtomicBool,
}

impl<T> ScrollSubscription<T>
where
    T: Send + Debug + 'static,
{
    fn new(actor: ActorRef<ScrollMsg<T>>, handle: JoinHandle<()>, metrics: Metrics) -> Self {
        Self {
            actor,
            handle: Some(handle),
            metrics,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Authorizes `n` more items. Cumulative; a no-op once the scroll has ended.
    pub async fn request(&self, n: u64) {
        if self.actor.send(ScrollMsg::Request(n)).await.is_err() {
            debug!(actor = self.actor.name(), n, "Request after scroll stopped; ignoring");
        }
    }

    /// Stops the scroll. Idempotent. A page fetch already in flight is not
    /// interrupted; its result is discarded when it arrives.
    pub async fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.actor.send(ScrollMsg::Cancel).await.is_err() {
            debug!(actor = self.actor.name(), "Cancel after scroll stopped; ignoring");
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) fn metrics_handle(&self) -> Metrics {
        self.metrics.clone()
    }

    pub fn name(&self) -> &str {
        self.actor.name()
    }

    /// Cancels the scroll (if still running) and waits for its actor to exit.
    ///
    /// The actor exits once every in-flight upstream call has reported back.
    pub async fn shutdown(mut self) -> Result<MetricsSnapshot, ActorError> {
        let handle = self.handle.take();
        let metrics = self.metrics.clone();
        self.cancel().await;
        drop(self);

        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| ActorError::Internal(e.to_string()))?;
        }
        Ok(metrics.snapshot())
    }
}

impl<T> Drop for ScrollSubscription<T>
where
    T: Send + Debug + 'static,
{
    fn drop(&mut self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        match self.actor.try_send(ScrollMsg::Cancel) {
            Ok(()) | Err(ActorError::MailboxClosed) => {}
            Err(_) => {
                // Mailbox full: deliver from a task rather than block in drop.
                if let Ok(runtime) = Handle::try_current() {
                    let actor = self.actor.clone();
                    runtime.spawn(async move {
                        let _ = actor.send(ScrollMsg::Cancel).await;
                    });
                }
            }
        }
    }
}
