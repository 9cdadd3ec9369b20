use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-held pagination handle for an open scroll.
///
/// Cursors are opaque: the adapter never looks inside them, it only hands the
/// most recently received one back to the upstream. Each successful fetch
/// replaces the cursor wholesale.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ScrollCursor(String);

impl ScrollCursor {
    pub fn new(token: impl Into<String>) -> Self {
        ScrollCursor(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScrollCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScrollCursor {
    fn from(token: &str) -> Self {
        ScrollCursor::new(token)
    }
}

impl From<String> for ScrollCursor {
    fn from(token: String) -> Self {
        ScrollCursor(token)
    }
}
