//! SimulatedTransport - failure injection for load runs
//!
//! Oversized batches always get `SplitRequested`; everything else draws one
//! outcome from the configured rates.

use contracts::{SendOutcome, SimulatedParams, Telemetry, TelemetryBatch, Transport};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Configuration for SimulatedTransport
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTransportConfig {
    /// Batches with more records are split
    pub max_batch_records: Option<usize>,
    /// Batches whose JSON payload is larger are split
    pub max_payload_bytes: Option<usize>,
    /// Probability of `BackoffRequested`
    pub backoff_rate: f64,
    /// Probability of `RequestedWait`
    pub wait_rate: f64,
    /// Wait returned with `RequestedWait`
    pub wait: Duration,
    /// Probability of `PermanentFailure`
    pub reject_rate: f64,
    /// Simulated round-trip time
    pub latency: Duration,
}

impl Default for SimulatedTransportConfig {
    fn default() -> Self {
        Self {
            max_batch_records: None,
            max_payload_bytes: None,
            backoff_rate: 0.0,
            wait_rate: 0.0,
            wait: Duration::from_millis(100),
            reject_rate: 0.0,
            latency: Duration::ZERO,
        }
    }
}

impl SimulatedTransportConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let parsed = SimulatedParams::from_params(params).map_err(|e| e.to_string())?;
        let defaults = Self::default();

        Ok(Self {
            max_batch_records: parsed.max_batch_records,
            max_payload_bytes: parsed.max_payload_bytes,
            backoff_rate: parsed.backoff_rate,
            wait_rate: parsed.wait_rate,
            wait: parsed.wait_ms.map(Duration::from_millis).unwrap_or(defaults.wait),
            reject_rate: parsed.reject_rate,
            latency: parsed
                .latency_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.latency),
        })
    }
}

/// Transport that fabricates outcomes
pub struct SimulatedTransport {
    name: String,
    config: SimulatedTransportConfig,
    sends: AtomicU64,
    accepted_records: AtomicU64,
}

impl SimulatedTransport {
    pub fn new(name: impl Into<String>, config: SimulatedTransportConfig) -> Self {
        Self {
            name: name.into(),
            config,
            sends: AtomicU64::new(0),
            accepted_records: AtomicU64::new(0),
        }
    }

    /// Create from params (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, String> {
        Ok(Self::new(name, SimulatedTransportConfig::from_params(params)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SimulatedTransportConfig {
        &self.config
    }

    /// Send calls so far
    pub fn sends(&self) -> u64 {
        self.sends.load(Ordering::Relaxed)
    }

    /// Records in batches answered with `Success`
    pub fn accepted_records(&self) -> u64 {
        self.accepted_records.load(Ordering::Relaxed)
    }

    fn is_oversized<T: Telemetry + Serialize>(&self, batch: &TelemetryBatch<T>) -> bool {
        if let Some(max) = self.config.max_batch_records {
            if batch.len() > max {
                return true;
            }
        }

        match self.config.max_payload_bytes {
            Some(max) => match serde_json::to_vec(batch.records()) {
                Ok(payload) => payload.len() > max,
                Err(e) => {
                    warn!(transport = %self.name, error = %e, "Failed to encode batch");
                    false
                }
            },
            None => false,
        }
    }

    fn draw(&self) -> SendOutcome {
        let roll: f64 = rand::rng().random();
        let config = &self.config;

        if roll < config.backoff_rate {
            SendOutcome::BackoffRequested
        } else if roll < config.backoff_rate + config.wait_rate {
            SendOutcome::RequestedWait(config.wait)
        } else if roll < config.backoff_rate + config.wait_rate + config.reject_rate {
            SendOutcome::permanent("simulated rejection")
        } else {
            SendOutcome::Success
        }
    }
}

impl<T: Telemetry + Serialize> Transport<T> for SimulatedTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "simulated_transport_send",
        skip(self, batch),
        fields(transport = %self.name, records = batch.len())
    )]
    async fn send(&self, batch: &TelemetryBatch<T>) -> SendOutcome {
        self.sends.fetch_add(1, Ordering::Relaxed);

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let outcome = if self.is_oversized(batch) {
            SendOutcome::SplitRequested
        } else {
            self.draw()
        };

        if outcome == SendOutcome::Success {
            self.accepted_records
                .fetch_add(batch.len() as u64, Ordering::Relaxed);
        }

        debug!(outcome = outcome.label(), "Simulated send");
        outcome
    }
}
