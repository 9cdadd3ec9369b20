use thiserror::Error;

/// Failures reported by an upstream scroll source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The search service could not be reached or timed out. Usually transient.
    #[error("Search service unavailable: {0}")]
    Unavailable(String),

    /// The service refused the request (malformed query, missing index, ...).
    #[error("Request rejected by search service: {0}")]
    Rejected(String),

    /// The cursor was unknown, expired, or already consumed.
    #[error("Invalid scroll cursor: {0}")]
    InvalidCursor(String),

    #[error("Unexpected source error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
