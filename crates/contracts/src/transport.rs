//! Transport trait - Dispatcher output interface
//!
//! Performs the network send of one batch and classifies the result.
//! Encoding, HTTP and authentication live behind this trait.

use crate::{SendOutcome, Telemetry, TelemetryBatch};

/// Batch delivery trait
///
/// One instance is shared by every dispatch stream, so implementations must
/// tolerate concurrent `send` calls.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport<T: Telemetry> {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send one batch
    ///
    /// Never errors: every failure is mapped onto a [`SendOutcome`] variant.
    async fn send(&self, batch: &TelemetryBatch<T>) -> SendOutcome;
}

impl<T, Tr> Transport<T> for std::sync::Arc<Tr>
where
    T: Telemetry,
    Tr: Transport<T> + Sync,
{
    fn name(&self) -> &str {
        Transport::<T>::name(&**self)
    }

    async fn send(&self, batch: &TelemetryBatch<T>) -> SendOutcome {
        Transport::<T>::send(&**self, batch).await
    }
}
