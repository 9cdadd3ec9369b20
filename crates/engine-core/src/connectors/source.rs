use crate::error::SourceError;
use async_trait::async_trait;
use model::{pagination::cursor::ScrollCursor, query::ScrollQuery, records::batch::Batch};
use std::{fmt::Debug, sync::Arc};

/// A paginated search result set that is read page by page through a cursor.
///
/// Contract:
///   * an empty batch unambiguously means "no more results",
///   * every non-empty batch carries a fresh cursor for the following call,
///   * cursors are single-use; `fetch_next` takes ownership of the one it consumes.
#[async_trait]
pub trait ScrollSource: Send + Sync + 'static {
    type Item: Send + Debug + 'static;

    /// Opens a scroll for `query` and returns its first page.
    async fn start_scroll(&self, query: &ScrollQuery) -> Result<Batch<Self::Item>, SourceError>;

    /// Fetches the page following the one `cursor` was issued with.
    async fn fetch_next(&self, cursor: ScrollCursor) -> Result<Batch<Self::Item>, SourceError>;
}

#[async_trait]
impl<S> ScrollSource for Arc<S>
where
    S: ScrollSource,
{
    type Item = S::Item;

    async fn start_scroll(&self, query: &ScrollQuery) -> Result<Batch<Self::Item>, SourceError> {
        self.as_ref().start_scroll(query).await
    }

    async fn fetch_next(&self, cursor: ScrollCursor) -> Result<Batch<Self::Item>, SourceError> {
        self.as_ref().fetch_next(cursor).await
    }
}
