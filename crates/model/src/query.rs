use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Describes a scroll to open against a search index.
///
/// The body is carried verbatim to the upstream; nothing in the adapter
/// interprets it. A zero `page_size` or `keep_alive` means "use the
/// publisher's configured default".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScrollQuery {
    pub index: String,
    pub doc_type: Option<String>,
    pub body: serde_json::Value,
    pub page_size: usize,
    pub keep_alive: Duration,
}

impl ScrollQuery {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            doc_type: None,
            body: serde_json::Value::Null,
            page_size: 0,
            keep_alive: Duration::ZERO,
        }
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Fills unset paging parameters from the given defaults.
    pub fn with_defaults(mut self, page_size: usize, keep_alive: Duration) -> Self {
        if self.page_size == 0 {
            self.page_size = page_size;
        }
        if self.keep_alive.is_zero() {
            self.keep_alive = keep_alive;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_sets_fields() {
        let query = ScrollQuery::new("articles")
            .doc_type("doc")
            .body(json!({ "match_all": {} }))
            .page_size(50);

        assert_eq!(query.index, "articles");
        assert_eq!(query.doc_type.as_deref(), Some("doc"));
        assert_eq!(query.page_size, 50);
        assert!(query.keep_alive.is_zero());
    }

    #[test]
    fn test_defaults_only_fill_unset_values() {
        let query = ScrollQuery::new("articles")
            .page_size(10)
            .with_defaults(100, Duration::from_secs(60));

        assert_eq!(query.page_size, 10);
        assert_eq!(query.keep_alive, Duration::from_secs(60));
    }
}
