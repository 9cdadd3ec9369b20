use crate::error::SourceError;
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::warn;

/// Whether a failed upstream call is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Outcome of an operation that never succeeded under a [`RetryPolicy`].
#[derive(Debug)]
pub enum RetryError<E> {
    /// Classified as permanent; returned after the first occurrence.
    Fatal(E),
    /// Transient, but every allowed attempt failed. Carries the last error.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(e) | RetryError::AttemptsExceeded(e) => e,
        }
    }
}

/// Capped exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        let max_delay = if max_delay < base_delay {
            base_delay
        } else {
            max_delay
        };

        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Runs `op` until it succeeds, fails permanently, or runs out of attempts.
    pub async fn run<F, Fut, T, E, C>(&self, mut op: F, classify: C) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0usize;

        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if classify(&err) == RetryDisposition::Stop {
                return Err(RetryError::Fatal(err));
            }

            attempt += 1;
            if attempt >= self.max_attempts {
                return Err(RetryError::AttemptsExceeded(err));
            }

            let delay = self.delay_for(attempt - 1);
            warn!(attempt, delay_ms = delay.as_millis() as u64, "Retrying upstream call");
            sleep(delay).await;
        }
    }

    /// Delay before retry number `retry` (zero-based), doubling up to `max_delay`.
    pub fn delay_for(&self, retry: usize) -> Duration {
        let factor = 1u32 << retry.min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Only connectivity problems are retried; a rejected query or a bad cursor
/// will fail the same way again.
pub fn classify_source_error(err: &SourceError) -> RetryDisposition {
    match err {
        SourceError::Unavailable(_) => RetryDisposition::Retry,
        SourceError::Rejected(_) => RetryDisposition::Stop,
        SourceError::InvalidCursor(_) => RetryDisposition::Stop,
        SourceError::Other(_) => RetryDisposition::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn fast_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(250));
        assert_eq!(policy.delay_for(40), Duration::from_millis(250));
    }

    #[test]
    fn test_new_clamps_attempts_and_delay() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10), Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.max_delay, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = fast_policy(3)
            .run(
                || {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(SourceError::Unavailable("timeout".into()))
                        } else {
                            Ok(7)
                        }
                    }
                },
                classify_source_error,
            )
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_stops_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy(5)
            .run(
                || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err(SourceError::Rejected("no such index".into())) }
                },
                classify_source_error,
            )
            .await;

        assert!(matches!(
            result,
            Err(RetryError::Fatal(SourceError::Rejected(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempts_exhausted_returns_last_error() {
        let result: Result<(), _> = fast_policy(2)
            .run(
                || async { Err(SourceError::Unavailable("down".into())) },
                classify_source_error,
            )
            .await;

        assert!(matches!(
            result,
            Err(RetryError::AttemptsExceeded(SourceError::Unavailable(_)))
        ));
    }
}
