use engine_core::error::SourceError;
use model::records::batch::Batch;
use std::fmt::Debug;

/// Messages for the Scroll actor.
///
/// Downstream signals and upstream results share this one mailbox, which is
/// what serializes them.
#[derive(Debug)]
pub enum ScrollMsg<T>
where
    T: Send + Debug + 'static,
{
    /// Open the scroll. Sent once by the publisher right after spawning.
    Subscribe,

    /// Downstream authorizes `n` more items.
    Request(u64),

    /// Downstream is no longer interested.
    Cancel,

    /// Result of `start_scroll`.
    Started(Result<Batch<T>, SourceError>),

    /// Result of `fetch_next`.
    Fetched(Result<Batch<T>, SourceError>),
}
