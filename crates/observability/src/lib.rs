//! # Observability
//!
//! Tracing + Prometheus setup and delivery metrics.
//!
//! ## Features
//!
//! - Tracing initialization (JSON / Pretty / Compact)
//! - Prometheus exporter
//! - `MetricsObserver`: terminal outcomes to metrics, logs and a summary
//!
//! ## Example
//!
//! ```ignore
//! use observability::{init, MetricsObserver};
//!
//! observability::init()?;
//!
//! let observer = Arc::new(MetricsObserver::new());
//! let dispatcher = BatchDispatcher::new(transport, Arc::clone(&observer));
//! // ...
//! observability::metrics::record_dispatch_snapshot(&dispatcher.metrics().snapshot());
//! println!("{}", observer.summary());
//! ```

pub mod metrics;
mod observer;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_dispatch_snapshot, record_outcome, DeliveryAggregator, DeliverySummary, KindCounts,
    RunningStats, StatsSummary,
};
pub use crate::observer::MetricsObserver;

/// Initialize tracing and Prometheus with defaults
///
/// - Tracing: JSON, honours `RUST_LOG`
/// - Prometheus: listens on 0.0.0.0:9000
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Used when `RUST_LOG` is unset
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: Some(9000),
            default_log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines
    #[default]
    Json,
    /// Multi-line, human readable
    Pretty,
    /// Single line
    Compact,
}

/// Initialize with a custom config
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus exporter
///
/// For when tracing is already set up elsewhere.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, Some(9000));
        assert_eq!(config.default_log_level, "info");
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
