use crate::settings::{
    error::SettingsError,
    validated::{ScrollSettings, ScrollSettingsBuilder},
};
use engine_core::retry::RetryPolicy;
use std::{collections::HashMap, str::FromStr, time::Duration};
use tracing::debug;

pub const MAILBOX_CAPACITY: &str = "SCROLL_MAILBOX_CAPACITY";
pub const PAGE_SIZE: &str = "SCROLL_PAGE_SIZE";
pub const KEEP_ALIVE_SECS: &str = "SCROLL_KEEP_ALIVE_SECS";
pub const MAX_ITEMS: &str = "SCROLL_MAX_ITEMS";
pub const PREFETCH: &str = "SCROLL_PREFETCH";
pub const RETRY_ATTEMPTS: &str = "SCROLL_RETRY_ATTEMPTS";
pub const RETRY_BASE_DELAY_MS: &str = "SCROLL_RETRY_BASE_DELAY_MS";

impl ScrollSettings {
    /// Builds settings from `SCROLL_*` variables. Missing keys keep their defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let mut builder = ScrollSettingsBuilder::default();

        if let Some(v) = parse::<usize>(vars, MAILBOX_CAPACITY)? {
            builder = builder.mailbox_capacity(v);
        }
        if let Some(v) = parse::<usize>(vars, PAGE_SIZE)? {
            builder = builder.page_size(v);
        }
        if let Some(v) = parse::<u64>(vars, KEEP_ALIVE_SECS)? {
            builder = builder.keep_alive(Duration::from_secs(v));
        }
        if let Some(v) = parse::<u64>(vars, MAX_ITEMS)? {
            builder = builder.max_items(v);
        }
        if let Some(v) = parse::<u64>(vars, PREFETCH)? {
            builder = builder.prefetch(v);
        }

        let attempts = parse::<usize>(vars, RETRY_ATTEMPTS)?;
        let base_delay = parse::<u64>(vars, RETRY_BASE_DELAY_MS)?;
        if attempts.is_some() || base_delay.is_some() {
            let defaults = RetryPolicy::default();
            builder = builder.retry(RetryPolicy::new(
                attempts.unwrap_or(defaults.max_attempts),
                base_delay
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.base_delay),
                defaults.max_delay,
            ));
        }

        builder.build()
    }
}

fn parse<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &'static str,
) -> Result<Option<T>, SettingsError> {
    let Some(raw) = vars.get(key) else {
        return Ok(None);
    };

    debug!(key, value = %raw, "Loading scroll setting");
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| SettingsError::Parse {
            key,
            value: raw.clone(),
        })
}
