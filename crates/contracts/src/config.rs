//! SenderConfig - Config Loader output
//!
//! Describes the full sender setup: retry policy, shutdown behaviour,
//! transport selection and the synthetic load used by the CLI.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::{ContractError, TelemetryKind};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete sender configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Service name attached to every batch as `service.name`
    pub service_name: String,

    /// Retry policy settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Shutdown settings
    #[serde(default)]
    pub shutdown: ShutdownConfig,

    /// Transport selection
    pub transport: TransportConfig,

    /// Synthetic load (CLI `run` only)
    #[serde(default)]
    pub load: LoadConfig,
}

/// Exponential backoff settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// First backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter as a fraction of the computed delay (0 disables jitter)
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_jitter_ratio() -> f64 {
    0.1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ratio: default_jitter_ratio(),
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Shutdown settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// How long in-flight streams may keep retrying after shutdown starts
    #[serde(default = "default_shutdown_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_shutdown_timeout_ms() -> u64 {
    3_000
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl ShutdownConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Transport name
    #[serde(default = "default_transport_name")]
    pub name: String,

    /// Transport type
    pub transport_type: TransportType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_transport_name() -> String {
    "default".to_string()
}

/// Transport type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// Log the batch and accept it
    Log,
    /// Failure injection for load runs
    Simulated,
}

/// Parsed `params` of a simulated transport
///
/// Single source of the param rules, shared by config validation and the
/// transport factory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatedParams {
    pub max_batch_records: Option<usize>,
    pub max_payload_bytes: Option<usize>,
    pub backoff_rate: f64,
    pub wait_rate: f64,
    pub reject_rate: f64,
    pub wait_ms: Option<u64>,
    pub latency_ms: Option<u64>,
}

impl SimulatedParams {
    /// Param keys understood by the simulated transport
    pub const KEYS: &'static [&'static str] = &[
        "max_batch_records",
        "max_payload_bytes",
        "backoff_rate",
        "wait_rate",
        "wait_ms",
        "reject_rate",
        "latency_ms",
    ];

    /// Parse and check `params`
    ///
    /// Rates must lie in `[0, 1]` and sum to at most 1; `max_batch_records`
    /// must be at least 1. Missing keys take their defaults.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let backoff_rate = parse_rate(params, "backoff_rate")?;
        let wait_rate = parse_rate(params, "wait_rate")?;
        let reject_rate = parse_rate(params, "reject_rate")?;

        let total = backoff_rate + wait_rate + reject_rate;
        if total > 1.0 {
            return Err(ContractError::config_validation(
                "transport.params",
                format!("backoff_rate + wait_rate + reject_rate must be <= 1, got {total}"),
            ));
        }

        let max_batch_records = parse_param::<usize>(params, "max_batch_records")?;
        if max_batch_records == Some(0) {
            return Err(ContractError::config_validation(
                "transport.params.max_batch_records",
                "max_batch_records must be >= 1",
            ));
        }

        Ok(Self {
            max_batch_records,
            max_payload_bytes: parse_param(params, "max_payload_bytes")?,
            backoff_rate,
            wait_rate,
            reject_rate,
            wait_ms: parse_param(params, "wait_ms")?,
            latency_ms: parse_param(params, "latency_ms")?,
        })
    }
}

fn parse_param<V: std::str::FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<V>, ContractError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ContractError::config_validation(
                format!("transport.params.{key}"),
                format!("'{raw}' is not a valid number"),
            )
        }),
    }
}

fn parse_rate(params: &HashMap<String, String>, key: &str) -> Result<f64, ContractError> {
    let rate = parse_param::<f64>(params, key)?.unwrap_or(0.0);
    if !(0.0..=1.0).contains(&rate) {
        return Err(ContractError::config_validation(
            format!("transport.params.{key}"),
            format!("{key} must be within [0, 1], got {rate}"),
        ));
    }
    Ok(rate)
}

/// Synthetic load generated by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Number of batches to dispatch
    #[serde(default = "default_batches")]
    pub batches: usize,

    /// Records per batch
    #[serde(default = "default_records_per_batch")]
    pub records_per_batch: usize,

    /// Record family to generate
    #[serde(default = "default_record_kind")]
    pub record_kind: TelemetryKind,
}

fn default_batches() -> usize {
    10
}

fn default_records_per_batch() -> usize {
    100
}

fn default_record_kind() -> TelemetryKind {
    TelemetryKind::Log
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batches: default_batches(),
            records_per_batch: default_records_per_batch(),
            record_kind: default_record_kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: SenderConfig = serde_json::from_str(
            r#"{ "service_name": "svc", "transport": { "transport_type": "log" } }"#,
        )
        .unwrap();

        assert_eq!(config.retry.base_delay(), Duration::from_secs(1));
        assert_eq!(config.retry.max_delay(), Duration::from_secs(60));
        assert_eq!(config.shutdown.timeout(), Duration::from_secs(3));
        assert_eq!(config.transport.name, "default");
        assert_eq!(config.load.record_kind, TelemetryKind::Log);
    }

    #[test]
    fn test_transport_type_snake_case() {
        let t: TransportType = serde_json::from_str(r#""simulated""#).unwrap();
        assert_eq!(t, TransportType::Simulated);
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn failing_field(pairs: &[(&str, &str)]) -> String {
        match SimulatedParams::from_params(&params(pairs)) {
            Err(ContractError::ConfigValidation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_simulated_params_defaults() {
        let parsed = SimulatedParams::from_params(&HashMap::new()).unwrap();
        assert_eq!(parsed, SimulatedParams::default());
    }

    #[test]
    fn test_simulated_params_parsed() {
        let parsed = SimulatedParams::from_params(&params(&[
            ("max_batch_records", "50"),
            ("backoff_rate", "0.25"),
            ("wait_ms", "400"),
        ]))
        .unwrap();
        assert_eq!(parsed.max_batch_records, Some(50));
        assert_eq!(parsed.backoff_rate, 0.25);
        assert_eq!(parsed.wait_ms, Some(400));
        assert_eq!(parsed.latency_ms, None);
    }

    #[test]
    fn test_simulated_params_rules() {
        assert_eq!(
            failing_field(&[("wait_rate", "1.5")]),
            "transport.params.wait_rate"
        );
        assert_eq!(
            failing_field(&[("reject_rate", "NaN")]),
            "transport.params.reject_rate"
        );
        assert_eq!(
            failing_field(&[("backoff_rate", "0.6"), ("wait_rate", "0.6")]),
            "transport.params"
        );
        assert_eq!(
            failing_field(&[("max_batch_records", "0")]),
            "transport.params.max_batch_records"
        );
        assert_eq!(
            failing_field(&[("latency_ms", "fast")]),
            "transport.params.latency_ms"
        );
    }
}
