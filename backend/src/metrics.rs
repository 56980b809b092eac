//! Oracle counters, backed by atomics for lock-free concurrent access.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    /// Reveal requests picked up by the listener or the catch-up scan.
    pub requests_received: AtomicU64,
    pub requests_fulfilled: AtomicU64,
    /// Fulfillments that failed with a retryable error.
    pub requests_failed: AtomicU64,
    /// Requests dropped because the episode no longer accepts them.
    pub requests_skipped: AtomicU64,
    /// Lifecycle events (chapter changes) observed in program logs.
    pub lifecycle_events: AtomicU64,
    pub fulfillment_latency_sum_ms: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fulfillment(&self, latency_ms: u64) {
        self.requests_fulfilled.fetch_add(1, Ordering::Relaxed);
        self.fulfillment_latency_sum_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.requests_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lifecycle_event(&self) {
        self.lifecycle_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Average fulfillment latency in milliseconds, or 0 if none.
    pub fn avg_latency_ms(&self) -> u64 {
        let count = self.requests_fulfilled.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        self.fulfillment_latency_sum_ms.load(Ordering::Relaxed) / count
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests_received": self.requests_received.load(Ordering::Relaxed),
            "requests_fulfilled": self.requests_fulfilled.load(Ordering::Relaxed),
            "requests_failed": self.requests_failed.load(Ordering::Relaxed),
            "requests_skipped": self.requests_skipped.load(Ordering::Relaxed),
            "lifecycle_events": self.lifecycle_events.load(Ordering::Relaxed),
            "avg_fulfillment_latency_ms": self.avg_latency_ms(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_latency() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_latency_ms(), 0);
        metrics.record_fulfillment(100);
        metrics.record_fulfillment(300);
        metrics.record_failure();
        assert_eq!(metrics.avg_latency_ms(), 200);

        let json = metrics.to_json();
        assert_eq!(json["requests_fulfilled"], 2);
        assert_eq!(json["requests_failed"], 1);
        assert_eq!(json["avg_fulfillment_latency_ms"], 200);
    }
}
