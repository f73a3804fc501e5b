//! Error types for CLI operations.

use contracts::ContractError;
use dispatcher::DispatcherError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or is invalid
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ContractError),

    /// Dispatcher rejected a batch or a transport could not be built
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatcherError),

    /// Metrics exporter setup error
    #[error("Failed to start metrics exporter: {message}")]
    Metrics { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn metrics(message: impl Into<String>) -> Self {
        Self::Metrics {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
