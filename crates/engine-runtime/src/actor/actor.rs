use crate::error::ActorError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Per-actor runtime information handed to every callback.
#[derive(Debug)]
pub struct ActorContext<M>
where
    M: Send + Debug + 'static,
{
    name: Arc<str>,
    myself: mpsc::WeakSender<M>,
}

impl<M> ActorContext<M>
where
    M: Send + Debug + 'static,
{
    pub fn new(name: impl Into<String>, myself: mpsc::WeakSender<M>) -> Self {
        Self {
            name: Arc::from(name.into()),
            myself,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A reference to this actor's own mailbox, for delivering the results of
    /// work it started. The context only holds a weak handle, so an actor never
    /// keeps itself alive: once every external `ActorRef` is gone this returns
    /// `None`.
    pub fn myself(&self) -> Option<ActorRef<M>> {
        self.myself
            .upgrade()
            .map(|tx| ActorRef::new(self.name.as_ref(), tx))
    }
}

/// Core actor trait.
///
/// Each actor processes a single message type `M` on a dedicated mailbox.
/// The runtime will:
///   * call `on_start` once,
///   * then call `handle` for every incoming message, one at a time,
///   * and finally call `on_stop` once the mailbox is closed.
#[async_trait]
pub trait Actor<M>: Send + 'static
where
    M: Send + Debug + 'static,
{
    /// Called once when the actor is started.
    async fn on_start(&mut self, _ctx: &ActorContext<M>) -> Result<(), ActorError> {
        Ok(())
    }

    /// Handle a single incoming message.
    async fn handle(&mut self, msg: M, ctx: &ActorContext<M>) -> Result<(), ActorError>;

    /// Called once when the mailbox is closed and the actor is about to stop.
    async fn on_stop(&mut self, _ctx: &ActorContext<M>) -> Result<(), ActorError> {
        Ok(())
    }
}

/// Handle used by other components to send messages to an actor.
#[derive(Debug)]
pub struct ActorRef<M>
where
    M: Send + Debug + 'static,
{
    name: Arc<str>,
    tx: mpsc::Sender<M>,
}

impl<M> Clone for ActorRef<M>
where
    M: Send + Debug + 'static,
{
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<M> ActorRef<M>
where
    M: Send + Debug + 'static,
{
    pub fn new(name: impl Into<Arc<str>>, tx: mpsc::Sender<M>) -> Self {
        Self {
            name: name.into(),
            tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asynchronously send a message, waiting for mailbox capacity.
    pub async fn send(&self, msg: M) -> Result<(), ActorError> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| ActorError::MailboxClosed)
    }

    /// Try to send a message without waiting.
    pub fn try_send(&self, msg: M) -> Result<(), ActorError> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => ActorError::MailboxFull,
            TrySendError::Closed(_) => ActorError::MailboxClosed,
        })
    }

    /// Whether the actor has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
