//! Transport implementations
//!
//! Contains LogTransport and SimulatedTransport, plus the config-driven factory.

mod log;
mod simulated;

pub use self::log::LogTransport;
pub use self::simulated::{SimulatedTransport, SimulatedTransportConfig};

use contracts::{SendOutcome, Telemetry, TelemetryBatch, Transport, TransportConfig, TransportType};
use serde::Serialize;
use tracing::instrument;

use crate::error::DispatcherError;

/// Transport chosen by configuration
pub enum ConfiguredTransport {
    Log(LogTransport),
    Simulated(SimulatedTransport),
}

impl ConfiguredTransport {
    pub fn name(&self) -> &str {
        match self {
            Self::Log(t) => t.name(),
            Self::Simulated(t) => t.name(),
        }
    }

    pub fn transport_type(&self) -> TransportType {
        match self {
            Self::Log(_) => TransportType::Log,
            Self::Simulated(_) => TransportType::Simulated,
        }
    }
}

impl<T: Telemetry + Serialize> Transport<T> for ConfiguredTransport {
    fn name(&self) -> &str {
        ConfiguredTransport::name(self)
    }

    async fn send(&self, batch: &TelemetryBatch<T>) -> SendOutcome {
        match self {
            Self::Log(t) => t.send(batch).await,
            Self::Simulated(t) => t.send(batch).await,
        }
    }
}

/// Create a transport from configuration
#[instrument(
    name = "dispatcher_create_transport",
    skip(config),
    fields(transport = %config.name, transport_type = ?config.transport_type)
)]
pub fn create_transport(config: &TransportConfig) -> Result<ConfiguredTransport, DispatcherError> {
    match config.transport_type {
        TransportType::Log => Ok(ConfiguredTransport::Log(LogTransport::new(&config.name))),
        TransportType::Simulated => SimulatedTransport::from_params(&config.name, &config.params)
            .map(ConfiguredTransport::Simulated)
            .map_err(|e| DispatcherError::transport_creation(&config.name, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_create_log_transport() {
        let config = TransportConfig {
            name: "console".to_string(),
            transport_type: TransportType::Log,
            params: HashMap::new(),
        };
        let transport = create_transport(&config).unwrap();
        assert_eq!(transport.name(), "console");
        assert_eq!(transport.transport_type(), TransportType::Log);
    }

    #[test]
    fn test_create_simulated_transport_bad_params() {
        let config = TransportConfig {
            name: "sim".to_string(),
            transport_type: TransportType::Simulated,
            params: HashMap::from([("reject_rate".to_string(), "2".to_string())]),
        };
        let err = create_transport(&config).err().unwrap();
        assert!(matches!(err, DispatcherError::TransportCreation { .. }));
        assert!(err.to_string().contains("reject_rate"));
    }
}
