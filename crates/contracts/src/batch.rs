//! TelemetryBatch - the unit handed to the dispatcher
//!
//! Immutable group of records sent as one request.

use std::sync::Arc;

use crate::{Attributes, Log, Metric, Span, Telemetry, TelemetryKind};

/// Immutable batch of telemetry records plus attributes shared by all of them
///
/// Splitting never mutates the batch; it produces two new batches that share
/// the same common attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryBatch<T> {
    records: Arc<[T]>,
    common_attributes: Arc<Attributes>,
}

pub type MetricBatch = TelemetryBatch<Metric>;
pub type LogBatch = TelemetryBatch<Log>;
pub type SpanBatch = TelemetryBatch<Span>;

impl<T: Telemetry> TelemetryBatch<T> {
    /// Create a batch from records and common attributes
    pub fn new(records: Vec<T>, common_attributes: Attributes) -> Self {
        Self {
            records: records.into(),
            common_attributes: Arc::new(common_attributes),
        }
    }

    /// Record family of this batch
    pub fn kind(&self) -> TelemetryKind {
        T::kind()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn common_attributes(&self) -> &Attributes {
        &self.common_attributes
    }

    /// Split into two contiguous halves of `floor(n/2)` and `ceil(n/2)` records
    ///
    /// Returns `None` when the batch holds fewer than two records.
    pub fn split(&self) -> Option<(Self, Self)> {
        let n = self.records.len();
        if n < 2 {
            return None;
        }

        let mid = n / 2;
        let (head, tail) = self.records.split_at(mid);
        Some((self.with_records(head), self.with_records(tail)))
    }

    fn with_records(&self, records: &[T]) -> Self {
        Self {
            records: records.into(),
            common_attributes: Arc::clone(&self.common_attributes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(n: u64) -> Log {
        Log {
            timestamp_ms: n,
            message: format!("line {n}"),
            attributes: Attributes::new(),
            service_name: None,
            log_type: None,
            level: Some("INFO".to_string()),
        }
    }

    fn batch_of(n: u64) -> LogBatch {
        TelemetryBatch::new((0..n).map(log).collect(), Attributes::new().put("foo", "bar"))
    }

    #[test]
    fn test_split_even() {
        let batch = batch_of(4);
        let (a, b) = batch.split().unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_split_odd_floor_then_ceil() {
        let batch = batch_of(7);
        let (a, b) = batch.split().unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_split_preserves_records_and_order() {
        let batch = batch_of(5);
        let (a, b) = batch.split().unwrap();

        let rejoined: Vec<Log> = a.records().iter().chain(b.records()).cloned().collect();
        assert_eq!(rejoined.as_slice(), batch.records());
    }

    #[test]
    fn test_split_copies_attributes() {
        let batch = batch_of(2);
        let (a, b) = batch.split().unwrap();
        assert_eq!(a.common_attributes(), batch.common_attributes());
        assert_eq!(b.common_attributes(), batch.common_attributes());
    }

    #[test]
    fn test_split_leaves_original_intact() {
        let batch = batch_of(3);
        let before = batch.clone();
        let _ = batch.split();
        assert_eq!(batch, before);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_split_refuses_small_batches() {
        assert!(batch_of(1).split().is_none());
        assert!(batch_of(0).split().is_none());
    }

    #[test]
    fn test_kind() {
        assert_eq!(batch_of(1).kind(), TelemetryKind::Log);
    }
}
