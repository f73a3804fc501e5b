//! # Dispatcher
//!
//! Batch delivery with adaptive retry.
//!
//! Responsibilities:
//! - Accept `TelemetryBatch` values without blocking the caller
//! - Run one background task per dispatch stream
//! - Retry with backoff or requested waits, split oversized batches
//! - Report exactly one terminal outcome per leaf stream

pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod mock;
pub mod policy;
mod stream;
pub mod transports;

pub use clock::TokioClock;
pub use contracts::{ObserverSink, TelemetryBatch, Transport};
pub use dispatcher::{BatchDispatcher, BatchDispatcherBuilder, ShutdownReport};
pub use error::DispatcherError;
pub use handle::DispatchHandle;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use policy::{Jitter, JitterRatio, RetryAction, RetryPolicy};
pub use transports::{create_transport, ConfiguredTransport, LogTransport, SimulatedTransport};
