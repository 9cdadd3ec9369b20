use crate::{
    actor::{
        actor::{Actor, ActorContext},
        messages::ScrollMsg,
    },
    error::ActorError,
    scroll::{
        machine::{Command, ScrollEvent, ScrollMachine},
        subscriber::Subscriber,
    },
};
use async_trait::async_trait;
use engine_core::{connectors::source::ScrollSource, metrics::Metrics};
use model::query::ScrollQuery;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one scroll: turns mailbox messages into machine events and carries
/// out the resulting commands.
///
/// Upstream calls run on their own tasks and report back through this actor's
/// mailbox, so they never touch the machine concurrently. A result that comes
/// back after termination is handed to the machine like any other event and
/// dropped there.
pub struct ScrollActor<S>
where
    S: ScrollSource,
{
    source: Arc<S>,
    query: ScrollQuery,
    machine: ScrollMachine<S::Item>,
    subscriber: Option<Box<dyn Subscriber<S::Item>>>,
    metrics: Metrics,
}

impl<S> ScrollActor<S>
where
    S: ScrollSource,
{
    pub fn new(
        source: Arc<S>,
        query: ScrollQuery,
        max_items: Option<u64>,
        subscriber: Box<dyn Subscriber<S::Item>>,
        metrics: Metrics,
    ) -> Self {
        Self {
            source,
            query,
            machine: ScrollMachine::new(max_items),
            subscriber: Some(subscriber),
            metrics,
        }
    }

    fn event_for(&self, msg: ScrollMsg<S::Item>) -> ScrollEvent<S::Item> {
        let live = !self.machine.is_terminated();

        match msg {
            ScrollMsg::Subscribe => ScrollEvent::Subscribe,
            ScrollMsg::Request(n) => {
                if live {
                    self.metrics.add_requested(n);
                }
                ScrollEvent::Request(n)
            }
            ScrollMsg::Cancel => ScrollEvent::Cancel,
            ScrollMsg::Started(Ok(batch)) => {
                if live {
                    self.metrics.increment_batches();
                }
                ScrollEvent::Started(batch)
            }
            ScrollMsg::Fetched(Ok(batch)) => {
                if live {
                    self.metrics.increment_batches();
                }
                ScrollEvent::Fetched(batch)
            }
            ScrollMsg::Started(Err(e)) | ScrollMsg::Fetched(Err(e)) => ScrollEvent::Failed(e),
        }
    }

    fn execute(
        &mut self,
        command: Command<S::Item>,
        ctx: &ActorContext<ScrollMsg<S::Item>>,
    ) -> Result<(), ActorError> {
        match command {
            Command::StartScroll => {
                let me = ctx.myself().ok_or(ActorError::MailboxClosed)?;
                let source = self.source.clone();
                let query = self.query.clone();

                info!(actor = ctx.name(), index = %query.index, "Starting scroll");
                tokio::spawn(async move {
                    let result = source.start_scroll(&query).await;
                    if me.send(ScrollMsg::Started(result)).await.is_err() {
                        debug!(actor = me.name(), "Scroll actor gone; dropping start result");
                    }
                });
            }

            Command::FetchNext(cursor) => {
                let me = ctx.myself().ok_or(ActorError::MailboxClosed)?;
                let source = self.source.clone();

                debug!(actor = ctx.name(), cursor = %cursor, "Fetching next page");
                tokio::spawn(async move {
                    let result = source.fetch_next(cursor).await;
                    if me.send(ScrollMsg::Fetched(result)).await.is_err() {
                        debug!(actor = me.name(), "Scroll actor gone; dropping page");
                    }
                });
            }

            Command::Emit(item) => {
                self.metrics.increment_emitted();
                if let Some(subscriber) = self.subscriber.as_mut() {
                    subscriber.on_next(item);
                }
            }

            Command::Complete => {
                if let Some(subscriber) = self.subscriber.as_mut() {
                    subscriber.on_complete();
                }
            }

            Command::Fail(error) => {
                self.metrics.increment_failures();
                if let Some(subscriber) = self.subscriber.as_mut() {
                    subscriber.on_error(error);
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<S> Actor<ScrollMsg<S::Item>> for ScrollActor<S>
where
    S: ScrollSource,
{
    async fn on_start(&mut self, ctx: &ActorContext<ScrollMsg<S::Item>>) -> Result<(), ActorError> {
        debug!(actor = ctx.name(), "Scroll actor started");
        Ok(())
    }

    async fn handle(
        &mut self,
        msg: ScrollMsg<S::Item>,
        ctx: &ActorContext<ScrollMsg<S::Item>>,
    ) -> Result<(), ActorError> {
        let event = self.event_for(msg);
        let commands = self.machine.handle(event);

        let mut outcome = Ok(());
        for command in commands {
            if let Err(e) = self.execute(command, ctx) {
                outcome = Err(e);
            }
        }

        if self.machine.is_terminated() && self.subscriber.take().is_some() {
            debug!(
                actor = ctx.name(),
                phase = ?self.machine.phase(),
                emitted = self.machine.emitted(),
                "Scroll terminated; released subscriber"
            );
        }

        outcome
    }

    async fn on_stop(&mut self, ctx: &ActorContext<ScrollMsg<S::Item>>) -> Result<(), ActorError> {
        if !self.machine.is_terminated() {
            info!(actor = ctx.name(), "All scroll handles dropped; abandoning scroll");
            self.machine.handle(ScrollEvent::Cancel);
            self.subscriber = None;
        }
        Ok(())
    }
}
