//! Delivery metrics
//!
//! Exports dispatcher counters and terminal outcomes through the `metrics`
//! facade and keeps an in-memory summary for the end-of-run report.

use std::collections::HashMap;

use contracts::{DeliveryReport, TelemetryKind, TerminalOutcome};
use dispatcher::MetricsSnapshot;
use metrics::{counter, gauge, histogram};

/// Publish dispatcher-wide counters
///
/// Counters are set to the absolute values of the snapshot, so this can be
/// called any number of times.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch_snapshot;
///
/// record_dispatch_snapshot(&dispatcher.metrics().snapshot());
/// ```
pub fn record_dispatch_snapshot(snapshot: &MetricsSnapshot) {
    counter!("telemetry_sender_sends_total").absolute(snapshot.send_count);

    counter!("telemetry_sender_retries_total", "kind" => "backoff")
        .absolute(snapshot.backoff_count);
    counter!("telemetry_sender_retries_total", "kind" => "requested_wait")
        .absolute(snapshot.requested_wait_count);

    counter!("telemetry_sender_splits_total").absolute(snapshot.split_count);
    counter!("telemetry_sender_policy_violations_total").absolute(snapshot.policy_violation_count);

    gauge!("telemetry_sender_streams_in_flight").set(snapshot.in_flight as f64);
}

/// Record one terminal outcome
pub fn record_outcome(report: &DeliveryReport) {
    counter!(
        "telemetry_sender_outcomes_total",
        "outcome" => report.outcome.label(),
        "kind" => report.kind.as_str()
    )
    .increment(1);

    counter!(
        "telemetry_sender_records_total",
        "outcome" => report.outcome.label(),
        "kind" => report.kind.as_str()
    )
    .increment(report.records as u64);

    histogram!("telemetry_sender_attempts_per_stream").record(f64::from(report.attempts));
}

/// Per-kind record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub delivered: u64,
    pub failed: u64,
    pub cancelled: u64,
}

/// In-memory aggregation of terminal outcomes
#[derive(Debug, Clone, Default)]
pub struct DeliveryAggregator {
    /// Leaf streams seen
    pub total_streams: u64,

    pub delivered_streams: u64,
    pub failed_streams: u64,
    pub cancelled_streams: u64,

    /// Records per outcome, by record family
    pub records_by_kind: HashMap<TelemetryKind, KindCounts>,

    /// Failed streams per reason label
    pub failure_reasons: HashMap<&'static str, u64>,

    /// Send attempts per leaf stream
    pub attempt_stats: RunningStats,

    /// Split depth of each leaf stream
    pub depth_stats: RunningStats,
}

impl DeliveryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one report into the totals
    pub fn update(&mut self, report: &DeliveryReport) {
        self.total_streams += 1;
        let records = report.records as u64;
        let counts = self.records_by_kind.entry(report.kind).or_default();

        match &report.outcome {
            TerminalOutcome::Delivered => {
                self.delivered_streams += 1;
                counts.delivered += records;
            }
            TerminalOutcome::Failed(reason) => {
                self.failed_streams += 1;
                counts.failed += records;
                *self.failure_reasons.entry(reason.label()).or_insert(0) += 1;
            }
            TerminalOutcome::Cancelled => {
                self.cancelled_streams += 1;
                counts.cancelled += records;
            }
        }

        self.attempt_stats.push(f64::from(report.attempts));
        self.depth_stats.push(report.lineage.depth() as f64);
    }

    /// Records across all kinds
    pub fn totals(&self) -> KindCounts {
        self.records_by_kind
            .values()
            .fold(KindCounts::default(), |acc, c| KindCounts {
                delivered: acc.delivered + c.delivered,
                failed: acc.failed + c.failed,
                cancelled: acc.cancelled + c.cancelled,
            })
    }

    pub fn summary(&self) -> DeliverySummary {
        let records = self.totals();
        let all_records = records.delivered + records.failed + records.cancelled;

        DeliverySummary {
            total_streams: self.total_streams,
            delivered_streams: self.delivered_streams,
            failed_streams: self.failed_streams,
            cancelled_streams: self.cancelled_streams,
            records,
            delivery_rate: if all_records > 0 {
                records.delivered as f64 / all_records as f64 * 100.0
            } else {
                0.0
            },
            attempts: StatsSummary::from(&self.attempt_stats),
            split_depth: StatsSummary::from(&self.depth_stats),
            failure_reasons: self.failure_reasons.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Delivery summary
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    pub total_streams: u64,
    pub delivered_streams: u64,
    pub failed_streams: u64,
    pub cancelled_streams: u64,
    pub records: KindCounts,
    /// Delivered records as a percentage of all reported records
    pub delivery_rate: f64,
    pub attempts: StatsSummary,
    pub split_depth: StatsSummary,
    pub failure_reasons: HashMap<&'static str, u64>,
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Delivery Summary ===")?;
        writeln!(
            f,
            "Streams: {} (delivered {}, failed {}, cancelled {})",
            self.total_streams, self.delivered_streams, self.failed_streams, self.cancelled_streams
        )?;
        writeln!(
            f,
            "Records delivered: {} ({:.2}%)",
            self.records.delivered, self.delivery_rate
        )?;
        writeln!(f, "Records failed: {}", self.records.failed)?;
        writeln!(f, "Records cancelled: {}", self.records.cancelled)?;
        writeln!(f, "Attempts per stream: {}", self.attempts)?;
        writeln!(f, "Split depth: {}", self.split_depth)?;

        if !self.failure_reasons.is_empty() {
            writeln!(f, "Failure reasons:")?;
            let mut reasons: Vec<_> = self.failure_reasons.iter().collect();
            reasons.sort();
            for (reason, count) in reasons {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.1}, max={:.1}, mean={:.2}, std={:.2} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// Streaming mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
