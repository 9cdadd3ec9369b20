use crate::{
    connectors::source::ScrollSource,
    error::SourceError,
    retry::{RetryPolicy, classify_source_error},
};
use async_trait::async_trait;
use model::{pagination::cursor::ScrollCursor, query::ScrollQuery, records::batch::Batch};

/// Applies a [`RetryPolicy`] to every call made against the wrapped source.
///
/// Retrying lives here, at the upstream boundary: the scroll adapter treats
/// any error it sees as terminal.
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSource<S>
where
    S: ScrollSource,
{
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<S> ScrollSource for RetryingSource<S>
where
    S: ScrollSource,
{
    type Item = S::Item;

    async fn start_scroll(&self, query: &ScrollQuery) -> Result<Batch<Self::Item>, SourceError> {
        self.policy
            .run(|| self.inner.start_scroll(query), classify_source_error)
            .await
            .map_err(|e| e.into_inner())
    }

    async fn fetch_next(&self, cursor: ScrollCursor) -> Result<Batch<Self::Item>, SourceError> {
        // A failed call never consumed the cursor, so repeating it is not reuse.
        self.policy
            .run(
                || self.inner.fetch_next(cursor.clone()),
                classify_source_error,
            )
            .await
            .map_err(|e| e.into_inner())
    }
}
