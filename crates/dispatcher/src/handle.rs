//! DispatchHandle - caller-side handle on a dispatched batch

use contracts::LineageId;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle returned by [`BatchDispatcher::dispatch`](crate::BatchDispatcher::dispatch)
///
/// Dropping the handle does not cancel anything; the batch keeps retrying in
/// the background.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    lineage: LineageId,
    token: CancellationToken,
}

impl DispatchHandle {
    pub(crate) fn new(lineage: LineageId, token: CancellationToken) -> Self {
        Self { lineage, token }
    }

    /// Lineage of the top-level stream
    pub fn lineage(&self) -> &LineageId {
        &self.lineage
    }

    /// Request cooperative cancellation of this dispatch and all its splits
    ///
    /// Takes effect at the next suspension point: an in-progress send
    /// completes first, a pending retry delay is cut short.
    pub fn cancel(&self) {
        debug!(lineage = %self.lineage, "Dispatch cancellation requested");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
