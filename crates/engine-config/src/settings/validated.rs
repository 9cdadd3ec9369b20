use crate::settings::error::SettingsError;
use engine_core::retry::RetryPolicy;
use std::time::Duration;

/// Immutable, validated configuration for scroll subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollSettings {
    /// Capacity of each scroll actor's mailbox
    pub mailbox_capacity: usize,
    /// Page size used when a query leaves it unset
    pub page_size: usize,
    /// Server-side cursor lifetime used when a query leaves it unset
    pub keep_alive: Duration,
    /// Stop after this many items, even if the upstream has more
    pub max_items: Option<u64>,
    /// Demand a `ScrollStream` keeps outstanding
    pub prefetch: u64,
    /// Policy for sources wrapped in `RetryingSource`
    pub retry: RetryPolicy,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            page_size: 100,
            keep_alive: Duration::from_secs(60),
            max_items: None,
            prefetch: 32,
            retry: RetryPolicy::default(),
        }
    }
}

impl ScrollSettings {
    pub fn builder() -> ScrollSettingsBuilder {
        ScrollSettingsBuilder::default()
    }

    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    pub fn max_items(&self) -> Option<u64> {
        self.max_items
    }

    pub fn prefetch(&self) -> u64 {
        self.prefetch
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

#[derive(Debug, Default, Clone)]
pub struct ScrollSettingsBuilder {
    pub mailbox_capacity: Option<usize>,
    pub page_size: Option<usize>,
    pub keep_alive: Option<Duration>,
    pub max_items: Option<u64>,
    pub prefetch: Option<u64>,
    pub retry: Option<RetryPolicy>,
}

impl ScrollSettingsBuilder {
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = Some(capacity);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn max_items(mut self, max_items: u64) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn prefetch(mut self, prefetch: u64) -> Self {
        self.prefetch = Some(prefetch);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> Result<ScrollSettings, SettingsError> {
        let defaults = ScrollSettings::default();
        let settings = ScrollSettings {
            mailbox_capacity: self.mailbox_capacity.unwrap_or(defaults.mailbox_capacity),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            keep_alive: self.keep_alive.unwrap_or(defaults.keep_alive),
            max_items: self.max_items,
            prefetch: self.prefetch.unwrap_or(defaults.prefetch),
            retry: self.retry.unwrap_or(defaults.retry),
        };

        validate(&settings)?;
        Ok(settings)
    }
}

fn validate(settings: &ScrollSettings) -> Result<(), SettingsError> {
    if settings.mailbox_capacity == 0 {
        return Err(invalid("mailbox_capacity", "must be at least 1"));
    }
    if settings.page_size == 0 {
        return Err(invalid("page_size", "must be at least 1"));
    }
    if settings.prefetch == 0 {
        return Err(invalid("prefetch", "must be at least 1"));
    }
    if settings.max_items == Some(0) {
        return Err(invalid("max_items", "must be positive when set"));
    }
    Ok(())
}

fn invalid(key: &'static str, reason: &str) -> SettingsError {
    SettingsError::Invalid {
        key,
        reason: reason.to_string(),
    }
}
