use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    items_requested: AtomicU64,
    items_emitted: AtomicU64,
    batches_fetched: AtomicU64,
    failure_count: AtomicU64,
}

/// Counters for one scroll subscription. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_requested: u64,
    pub items_emitted: u64,
    pub batches_fetched: u64,
    pub failure_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_requested(&self, count: u64) {
        let requested = &self.inner.items_requested;
        let mut current = requested.load(Ordering::Relaxed);
        // Saturate instead of wrapping: an "unbounded" request is u64::MAX.
        while let Err(actual) = requested.compare_exchange_weak(
            current,
            current.saturating_add(count),
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            current = actual;
        }
    }

    pub fn increment_emitted(&self) {
        self.inner.items_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_batches(&self) {
        self.inner.batches_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.inner.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_requested: self.inner.items_requested.load(Ordering::Relaxed),
            items_emitted: self.inner.items_emitted.load(Ordering::Relaxed),
            batches_fetched: self.inner.batches_fetched.load(Ordering::Relaxed),
            failure_count: self.inner.failure_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();

        clone.increment_emitted();
        clone.increment_batches();
        metrics.add_requested(u64::MAX);
        metrics.add_requested(5);

        let snap = metrics.snapshot();
        assert_eq!(snap.items_emitted, 1);
        assert_eq!(snap.batches_fetched, 1);
        assert_eq!(snap.items_requested, u64::MAX);
        assert_eq!(snap.failure_count, 0);
    }
}
