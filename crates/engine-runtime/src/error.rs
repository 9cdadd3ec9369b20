use engine_core::error::SourceError;
use thiserror::Error;

/// Terminal error delivered to a scroll's downstream.
#[derive(Debug, Error)]
pub enum ScrollError {
    /// Opening the scroll failed; no item was ever produced.
    #[error("Failed to start scroll: {0}")]
    Start(#[source] SourceError),

    /// A page fetch failed after the scroll was running. Buffered items are discarded.
    #[error("Failed to fetch page {page} of scroll: {source}")]
    Fetch {
        page: u64,
        #[source]
        source: SourceError,
    },
}

impl ScrollError {
    /// The upstream failure behind this error.
    pub fn cause(&self) -> &SourceError {
        match self {
            ScrollError::Start(source) | ScrollError::Fetch { source, .. } => source,
        }
    }
}

/// Common error type for all actors in the engine.
#[derive(Debug, Error)]
pub enum ActorError {
    #[error("Mailbox closed")]
    MailboxClosed,

    #[error("Mailbox full")]
    MailboxFull,

    #[error("Actor internal error: {0}")]
    Internal(String),
}
