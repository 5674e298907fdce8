// Metrics collection for the persistence worker

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by producers (enqueue side) and the worker (completion side)
#[derive(Debug)]
pub struct WorkerMetrics {
    pub requests_enqueued: AtomicCounter,
    pub scenes_persisted: AtomicCounter,
    pub metadata_persisted: AtomicCounter,
    pub failures: AtomicCounter,
    /// Duration of the most recent adaptor call in microseconds
    pub last_persist_latency_us: AtomicCounter,
    pub started_at: Instant,
}

/// Point-in-time copy of [`WorkerMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_enqueued: u64,
    pub scenes_persisted: u64,
    pub metadata_persisted: u64,
    pub failures: u64,
    pub last_persist_latency_us: u64,
}

impl MetricsSnapshot {
    /// Requests that went through an adaptor, successfully or not
    pub fn processed(&self) -> u64 {
        self.scenes_persisted + self.metadata_persisted + self.failures
    }
}

impl Default for WorkerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self {
            requests_enqueued: AtomicCounter::new(),
            scenes_persisted: AtomicCounter::new(),
            metadata_persisted: AtomicCounter::new(),
            failures: AtomicCounter::new(),
            last_persist_latency_us: AtomicCounter::new(),
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn record_latency(&self, elapsed: Duration) {
        self.last_persist_latency_us.set(elapsed.as_micros() as u64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_enqueued: self.requests_enqueued.get(),
            scenes_persisted: self.scenes_persisted.get(),
            metadata_persisted: self.metadata_persisted.get(),
            failures: self.failures.get(),
            last_persist_latency_us: self.last_persist_latency_us.get(),
        }
    }
}

/// Relaxed atomic counter
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self { value: AtomicU64::new(0) }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_snapshot() {
        let metrics = WorkerMetrics::new();
        metrics.requests_enqueued.inc();
        metrics.requests_enqueued.inc();
        metrics.scenes_persisted.inc();
        metrics.failures.inc();
        metrics.record_latency(Duration::from_millis(3));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_enqueued, 2);
        assert_eq!(snapshot.scenes_persisted, 1);
        assert_eq!(snapshot.metadata_persisted, 0);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.processed(), 2);
        assert_eq!(snapshot.last_persist_latency_us, 3_000);
    }
}
