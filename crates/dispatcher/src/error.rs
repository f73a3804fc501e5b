//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Only synchronous precondition failures surface here; remote failures are
/// absorbed by the retry loop and reported to the observer.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Batch with no records passed to `dispatch`
    #[error("cannot dispatch an empty batch")]
    EmptyBatch,

    /// `dispatch` called after shutdown started
    #[error("dispatcher is shutting down")]
    ShuttingDown,

    /// Transport creation error
    #[error("failed to create transport '{name}': {message}")]
    TransportCreation { name: String, message: String },
}

impl DispatcherError {
    /// Create a transport creation error
    pub fn transport_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
