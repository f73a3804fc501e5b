//! LogTransport - logs batch summary via tracing and accepts it

use contracts::{SendOutcome, Telemetry, TelemetryBatch, Transport};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Transport that logs batch summaries instead of sending them
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn log_batch_summary<T: Telemetry + Serialize>(&self, batch: &TelemetryBatch<T>) {
        let payload_bytes = match serde_json::to_vec(batch.records()) {
            Ok(payload) => payload.len(),
            Err(e) => {
                warn!(transport = %self.name, error = %e, "Failed to encode batch for size estimate");
                0
            }
        };

        info!(
            transport = %self.name,
            kind = %batch.kind(),
            records = batch.len(),
            common_attributes = batch.common_attributes().len(),
            payload_bytes,
            "TelemetryBatch received"
        );
    }
}

impl<T: Telemetry + Serialize> Transport<T> for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, batch),
        fields(transport = %self.name, records = batch.len())
    )]
    async fn send(&self, batch: &TelemetryBatch<T>) -> SendOutcome {
        self.log_batch_summary(batch);
        SendOutcome::Success
    }
}
