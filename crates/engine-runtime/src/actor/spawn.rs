use crate::actor::{Actor, ActorContext, ActorRef};
use std::fmt::Debug;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error};

/// Spawns a Tokio task that runs the actor event loop and returns an `ActorRef` and `JoinHandle`.
///
/// The mailbox is the actor's only input, so every state change happens inside
/// one `handle` call at a time. The loop ends when the last `ActorRef` is dropped.
pub fn spawn_actor<M, A>(
    name: impl Into<String>,
    mailbox_capacity: usize,
    mut actor: A,
) -> (ActorRef<M>, JoinHandle<()>)
where
    A: Actor<M>,
    M: Send + Debug + 'static,
{
    let name: String = name.into();
    let (tx, mut rx) = mpsc::channel::<M>(mailbox_capacity.max(1));
    let ctx = ActorContext::new(name.clone(), tx.downgrade());
    let actor_ref = ActorRef::new(name, tx);

    let handle = tokio::spawn(async move {
        if let Err(e) = actor.on_start(&ctx).await {
            error!(actor = %ctx.name(), ?e, "actor on_start failed");
            return;
        }

        while let Some(msg) = rx.recv().await {
            if let Err(e) = actor.handle(msg, &ctx).await {
                error!(actor = %ctx.name(), ?e, "actor handle failed");
            }
        }

        if let Err(e) = actor.on_stop(&ctx).await {
            error!(actor = %ctx.name(), ?e, "actor on_stop failed");
        }
        debug!(actor = %ctx.name(), "actor stopped");
    });

    (actor_ref, handle)
}
