//! ObserverSink - receives one report per finished dispatch stream

use crate::{LineageId, TelemetryKind, TerminalOutcome};

/// Terminal report for one leaf dispatch stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Stream lineage (root id plus split path)
    pub lineage: LineageId,

    /// Record family of the batch
    pub kind: TelemetryKind,

    /// Records in the batch this stream owned
    pub records: usize,

    /// Send attempts made by this stream
    pub attempts: u32,

    pub outcome: TerminalOutcome,
}

/// Caller-visible outcome observer
///
/// Called from dispatcher tasks; must not block.
pub trait ObserverSink: Send + Sync + 'static {
    fn on_terminal_outcome(&self, report: DeliveryReport);
}

impl<O: ObserverSink> ObserverSink for std::sync::Arc<O> {
    fn on_terminal_outcome(&self, report: DeliveryReport) {
        (**self).on_terminal_outcome(report)
    }
}
