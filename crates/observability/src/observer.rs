//! MetricsObserver - ObserverSink that feeds metrics, logs and the summary

use std::sync::{Mutex, MutexGuard};

use contracts::{DeliveryReport, ObserverSink, TerminalOutcome};
use tracing::{debug, info, warn};

use crate::metrics::{record_outcome, DeliveryAggregator, DeliverySummary};

/// Observer that records every terminal outcome
///
/// Permanent failures are logged at `warn`, everything else at `debug`.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    aggregator: Mutex<DeliveryAggregator>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn aggregator(&self) -> MutexGuard<'_, DeliveryAggregator> {
        self.aggregator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Summary of everything observed so far
    pub fn summary(&self) -> DeliverySummary {
        self.aggregator().summary()
    }

    /// Number of terminal reports received
    pub fn reported(&self) -> u64 {
        self.aggregator().total_streams
    }
}

impl ObserverSink for MetricsObserver {
    fn on_terminal_outcome(&self, report: DeliveryReport) {
        record_outcome(&report);

        match &report.outcome {
            TerminalOutcome::Delivered => debug!(
                lineage = %report.lineage,
                kind = %report.kind,
                records = report.records,
                attempts = report.attempts,
                "Batch delivered"
            ),
            TerminalOutcome::Failed(reason) => warn!(
                lineage = %report.lineage,
                kind = %report.kind,
                records = report.records,
                attempts = report.attempts,
                reason = %reason,
                "Batch dropped after permanent failure"
            ),
            TerminalOutcome::Cancelled => info!(
                lineage = %report.lineage,
                kind = %report.kind,
                records = report.records,
                attempts = report.attempts,
                "Batch cancelled before delivery"
            ),
        }

        self.aggregator().update(&report);
    }
}
