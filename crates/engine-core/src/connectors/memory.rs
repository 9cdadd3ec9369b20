use crate::{connectors::source::ScrollSource, error::SourceError};
use async_trait::async_trait;
use model::{pagination::cursor::ScrollCursor, query::ScrollQuery, records::batch::Batch};
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use tracing::debug;

/// Serves a fixed list of pages through the scroll contract.
///
/// Every `start_scroll` opens an independent scroll. Cursor `mem-S-N` yields
/// page `N + 1` of scroll `S`; once the pages run out every fetch answers with
/// an empty batch. Only the most recently issued cursor of a scroll is
/// accepted; anything else is rejected as [`SourceError::InvalidCursor`].
pub struct MemorySource<T> {
    pages: Vec<Vec<T>>,
    next_scroll: AtomicU64,
    // scroll id -> page index of its latest cursor
    latest: Mutex<HashMap<u64, u64>>,
    calls: AtomicUsize,
}

impl<T> MemorySource<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(pages: Vec<Vec<T>>) -> Self {
        Self {
            pages,
            next_scroll: AtomicU64::new(0),
            latest: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Splits `items` into pages of `page_size`.
    pub fn from_items(items: Vec<T>, page_size: usize) -> Self {
        let pages = items
            .chunks(page_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();
        Self::new(pages)
    }

    /// Number of upstream calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn page(&self, scroll: u64, index: u64) -> Batch<T> {
        let items = usize::try_from(index)
            .ok()
            .and_then(|i| self.pages.get(i))
            .cloned()
            .unwrap_or_default();
        Batch::new(format!("mem-{scroll}-{index}"), items)
    }

    fn parse(cursor: &ScrollCursor) -> Option<(u64, u64)> {
        let (scroll, index) = cursor.as_str().strip_prefix("mem-")?.split_once('-')?;
        Some((scroll.parse().ok()?, index.parse().ok()?))
    }

    /// Moves `scroll` from page `index` to the next one, if `index` is its
    /// latest page.
    fn advance(&self, scroll: u64, index: u64) -> Result<(), SourceError> {
        let mut latest = self
            .latest
            .lock()
            .map_err(|_| SourceError::Unavailable("memory source poisoned".into()))?;

        match latest.get_mut(&scroll) {
            Some(current) if *current == index => {
                *current += 1;
                Ok(())
            }
            _ => Err(SourceError::InvalidCursor(format!("mem-{scroll}-{index}"))),
        }
    }
}

#[async_trait]
impl<T> ScrollSource for MemorySource<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    type Item = T;

    async fn start_scroll(&self, query: &ScrollQuery) -> Result<Batch<T>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scroll = self.next_scroll.fetch_add(1, Ordering::SeqCst);
        debug!(index = %query.index, scroll, pages = self.pages.len(), "Opening in-memory scroll");

        self.latest
            .lock()
            .map_err(|_| SourceError::Unavailable("memory source poisoned".into()))?
            .insert(scroll, 0);
        Ok(self.page(scroll, 0))
    }

    async fn fetch_next(&self, cursor: ScrollCursor) -> Result<Batch<T>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (scroll, index) =
            Self::parse(&cursor).ok_or_else(|| SourceError::InvalidCursor(cursor.to_string()))?;
        self.advance(scroll, index)?;

        Ok(self.page(scroll, index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_are_served_in_order_then_empty() {
        let source = MemorySource::from_items(vec!["a", "b", "c"], 2);
        let query = ScrollQuery::new("idx");

        let first = source.start_scroll(&query).await.unwrap();
        assert_eq!(first.items, vec!["a", "b"]);

        let second = source.fetch_next(first.cursor).await.unwrap();
        assert_eq!(second.items, vec!["c"]);

        let end = source.fetch_next(second.cursor).await.unwrap();
        assert!(end.is_empty());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_stale_cursor_is_rejected() {
        let source = MemorySource::new(vec![vec![1], vec![2], vec![3]]);
        let first = source.start_scroll(&ScrollQuery::new("idx")).await.unwrap();
        let stale = first.cursor.clone();

        source.fetch_next(first.cursor).await.unwrap();
        let err = source.fetch_next(stale).await.unwrap_err();

        assert!(matches!(err, SourceError::InvalidCursor(c) if c == "mem-0-0"));
    }

    #[tokio::test]
    async fn test_foreign_cursor_is_rejected() {
        let source = MemorySource::new(vec![vec![1]]);
        source.start_scroll(&ScrollQuery::new("idx")).await.unwrap();

        let err = source
            .fetch_next(ScrollCursor::new("DXF1ZXJ5QW5kRmV0Y2gBAAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_concurrent_scrolls_keep_their_own_cursors() {
        let source = MemorySource::new(vec![vec![1], vec![2], vec![3]]);
        let query = ScrollQuery::new("idx");

        let a = source.start_scroll(&query).await.unwrap();
        let b = source.start_scroll(&query).await.unwrap();
        assert_ne!(a.cursor, b.cursor);

        let a = source.fetch_next(a.cursor).await.unwrap();
        let b = source.fetch_next(b.cursor).await.unwrap();
        assert_eq!(a.items, vec![2]);
        assert_eq!(b.items, vec![2]);

        assert_eq!(source.fetch_next(b.cursor).await.unwrap().items, vec![3]);
        assert_eq!(source.fetch_next(a.cursor).await.unwrap().items, vec![3]);
    }
}
