//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Aggregate counters across all dispatch streams
///
/// Shared by every stream; streams only ever add to it.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Streams currently running
    in_flight: AtomicUsize,
    /// Total send attempts
    send_count: AtomicU64,
    /// Retries scheduled by exponential backoff
    backoff_count: AtomicU64,
    /// Retries scheduled by a server-requested wait
    requested_wait_count: AtomicU64,
    /// Batches split in two
    split_count: AtomicU64,
    /// Split requested on a one-record batch
    policy_violation_count: AtomicU64,
    /// Leaf streams delivered
    delivered_count: AtomicU64,
    /// Leaf streams permanently failed
    failed_count: AtomicU64,
    /// Leaf streams cancelled
    cancelled_count: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of running streams
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn stream_started(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the number of streams still running
    pub(crate) fn stream_finished(&self) -> usize {
        self.in_flight.fetch_sub(1, Ordering::AcqRel) - 1
    }

    /// Get total send attempts
    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_send_count(&self) {
        self.send_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn backoff_count(&self) -> u64 {
        self.backoff_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_backoff_count(&self) {
        self.backoff_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requested_wait_count(&self) -> u64 {
        self.requested_wait_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_requested_wait_count(&self) {
        self.requested_wait_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn split_count(&self) -> u64 {
        self.split_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_split_count(&self) {
        self.split_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn policy_violation_count(&self) -> u64 {
        self.policy_violation_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_policy_violation_count(&self) {
        self.policy_violation_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_delivered_count(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_failed_count(&self) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cancelled_count(&self) -> u64 {
        self.cancelled_count.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_cancelled_count(&self) {
        self.cancelled_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            in_flight: self.in_flight(),
            send_count: self.send_count(),
            backoff_count: self.backoff_count(),
            requested_wait_count: self.requested_wait_count(),
            split_count: self.split_count(),
            policy_violation_count: self.policy_violation_count(),
            delivered_count: self.delivered_count(),
            failed_count: self.failed_count(),
            cancelled_count: self.cancelled_count(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub in_flight: usize,
    pub send_count: u64,
    pub backoff_count: u64,
    pub requested_wait_count: u64,
    pub split_count: u64,
    pub policy_violation_count: u64,
    pub delivered_count: u64,
    pub failed_count: u64,
    pub cancelled_count: u64,
}

impl MetricsSnapshot {
    /// Leaf streams that reached a terminal outcome
    pub fn terminal_count(&self) -> u64 {
        self.delivered_count + self.failed_count + self.cancelled_count
    }
}
