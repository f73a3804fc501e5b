//! Config validation
//!
//! Rules:
//! - service_name is not blank
//! - retry: base_delay_ms > 0, max_delay_ms >= base_delay_ms, jitter_ratio in [0, 1]
//! - shutdown.timeout_ms > 0
//! - transport name is not blank, simulated params are well formed
//! - load sizes >= 1

use contracts::{ContractError, SenderConfig, SimulatedParams, TransportType};

/// Params understood by the simulated transport
pub const SIMULATED_PARAMS: &[&str] = SimulatedParams::KEYS;

/// Validate a SenderConfig
///
/// Returns the first error found.
pub fn validate(config: &SenderConfig) -> Result<(), ContractError> {
    validate_service_name(config)?;
    validate_retry(config)?;
    validate_shutdown(config)?;
    validate_transport(config)?;
    validate_load(config)?;
    Ok(())
}

/// Non-fatal findings, such as params the transport will ignore
pub fn warnings(config: &SenderConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let transport = &config.transport;

    let known: &[&str] = match transport.transport_type {
        TransportType::Log => &[],
        TransportType::Simulated => SIMULATED_PARAMS,
    };

    let mut unknown: Vec<_> = transport
        .params
        .keys()
        .filter(|k| !known.contains(&k.as_str()))
        .collect();
    unknown.sort();
    for key in unknown {
        warnings.push(format!(
            "transport.params.{} is ignored by {:?} transport",
            key, transport.transport_type
        ));
    }

    if config.retry.jitter_ratio == 0.0 {
        warnings.push("retry.jitter_ratio is 0, concurrent retries will be synchronized".into());
    }

    warnings
}

fn validate_service_name(config: &SenderConfig) -> Result<(), ContractError> {
    if config.service_name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "service_name",
            "service_name cannot be empty",
        ));
    }
    Ok(())
}

fn validate_retry(config: &SenderConfig) -> Result<(), ContractError> {
    let retry = &config.retry;

    if retry.base_delay_ms == 0 {
        return Err(ContractError::config_validation(
            "retry.base_delay_ms",
            "base_delay_ms must be > 0",
        ));
    }

    if retry.max_delay_ms < retry.base_delay_ms {
        return Err(ContractError::config_validation(
            "retry.base_delay_ms / retry.max_delay_ms",
            format!(
                "max_delay_ms ({}) must be >= base_delay_ms ({})",
                retry.max_delay_ms, retry.base_delay_ms
            ),
        ));
    }

    if !(0.0..=1.0).contains(&retry.jitter_ratio) {
        return Err(ContractError::config_validation(
            "retry.jitter_ratio",
            format!("jitter_ratio must be within [0, 1], got {}", retry.jitter_ratio),
        ));
    }

    Ok(())
}

fn validate_shutdown(config: &SenderConfig) -> Result<(), ContractError> {
    if config.shutdown.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "shutdown.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }
    Ok(())
}

fn validate_transport(config: &SenderConfig) -> Result<(), ContractError> {
    let transport = &config.transport;

    if transport.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "transport.name",
            "transport name cannot be empty",
        ));
    }

    match transport.transport_type {
        TransportType::Log => Ok(()),
        TransportType::Simulated => SimulatedParams::from_params(&transport.params).map(|_| ()),
    }
}

fn validate_load(config: &SenderConfig) -> Result<(), ContractError> {
    if config.load.batches == 0 {
        return Err(ContractError::config_validation(
            "load.batches",
            "batches must be >= 1",
        ));
    }
    if config.load.records_per_batch == 0 {
        return Err(ContractError::config_validation(
            "load.records_per_batch",
            "records_per_batch must be >= 1",
        ));
    }
    Ok(())
}
