//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the sender workspace:
//! telemetry records and batches, transport signals, and the collaborator
//! traits the dispatcher is built against.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Record timestamps are epoch milliseconds (`u64`)
//! - Retry delays are `std::time::Duration`, waited out through [`Clock`]

mod attributes;
mod batch;
mod clock;
mod config;
mod error;
mod lineage;
mod observer;
mod record;
mod signal;
mod transport;

pub use attributes::{AttributeValue, Attributes};
pub use batch::{LogBatch, MetricBatch, SpanBatch, TelemetryBatch};
pub use clock::{Clock, LocalClock};
pub use config::*;
pub use error::*;
pub use lineage::LineageId;
pub use observer::{DeliveryReport, ObserverSink};
pub use record::*;
pub use signal::{FailureReason, SendOutcome, TerminalOutcome};
pub use transport::{LocalTransport, Transport};
