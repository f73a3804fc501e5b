//! Transport signals and terminal outcomes

use std::time::Duration;

/// Result of a single send attempt, as classified by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Accepted by the remote endpoint
    Success,
    /// Transient failure, retry with exponential backoff
    BackoffRequested,
    /// Remote asked for an explicit wait (e.g. Retry-After)
    RequestedWait(Duration),
    /// Payload too large, split and retry each half
    SplitRequested,
    /// Will never succeed
    PermanentFailure { reason: String },
}

impl SendOutcome {
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::PermanentFailure {
            reason: reason.into(),
        }
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::BackoffRequested => "backoff",
            Self::RequestedWait(_) => "requested_wait",
            Self::SplitRequested => "split",
            Self::PermanentFailure { .. } => "permanent",
        }
    }
}

/// Why a stream ended without delivering its batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Transport reported a permanent failure
    Rejected(String),
    /// Split requested on a batch with a single record
    Unsplittable,
    /// Stream task panicked (transport, observer or policy)
    Aborted(String),
}

impl FailureReason {
    /// Bounded label, independent of any free-form text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Unsplittable => "unsplittable",
            Self::Aborted(_) => "aborted",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
            Self::Unsplittable => f.write_str("split requested on a single-record batch"),
            Self::Aborted(message) => write!(f, "stream aborted: {message}"),
        }
    }
}

/// How a dispatch stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutcome {
    Delivered,
    Failed(FailureReason),
    Cancelled,
}

impl TerminalOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}
