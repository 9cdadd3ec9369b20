use crate::pagination::cursor::ScrollCursor;
use serde::{Deserialize, Serialize};

/// One page of a scroll, as returned by the upstream.
///
/// `cursor` is the key for fetching the *next* page. An empty `items` vector
/// is the only end-of-results signal; there is no separate "has more" flag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Batch<T> {
    pub cursor: ScrollCursor,
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    pub fn new(cursor: impl Into<ScrollCursor>, items: Vec<T>) -> Self {
        Self {
            cursor: cursor.into(),
            items,
        }
    }

    /// An end-of-results page.
    pub fn empty(cursor: impl Into<ScrollCursor>) -> Self {
        Self::new(cursor, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_parts(self) -> (ScrollCursor, Vec<T>) {
        (self.cursor, self.items)
    }
}
