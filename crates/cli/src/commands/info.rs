//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::SenderConfig;
use dispatcher::RetryPolicy;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    service_name: String,
    transport: TransportInfo,
    retry: RetryInfo,
    shutdown_timeout_ms: u64,
    load: LoadInfo,
}

#[derive(Serialize)]
struct TransportInfo {
    name: String,
    transport_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct RetryInfo {
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_ratio: f64,
    /// Un-jittered delay before each successive backoff retry
    backoff_schedule_ms: Vec<u64>,
}

#[derive(Serialize)]
struct LoadInfo {
    batches: usize,
    records_per_batch: usize,
    record_kind: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let info = build_config_info(&config, args.schedule);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn backoff_schedule(config: &SenderConfig, steps: u32) -> Vec<u64> {
    let policy = RetryPolicy::from_config(&config.retry).without_jitter();
    (0..steps)
        .map(|step| policy.backoff_delay(step).as_millis() as u64)
        .collect()
}

fn build_config_info(config: &SenderConfig, steps: u32) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        service_name: config.service_name.clone(),
        transport: TransportInfo {
            name: config.transport.name.clone(),
            transport_type: format!("{:?}", config.transport.transport_type),
            params: config
                .transport
                .params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        },
        retry: RetryInfo {
            base_delay_ms: config.retry.base_delay_ms,
            max_delay_ms: config.retry.max_delay_ms,
            jitter_ratio: config.retry.jitter_ratio,
            backoff_schedule_ms: backoff_schedule(config, steps),
        },
        shutdown_timeout_ms: config.shutdown.timeout_ms,
        load: LoadInfo {
            batches: config.load.batches,
            records_per_batch: config.load.records_per_batch,
            record_kind: config.load.record_kind.to_string(),
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Telemetry Sender Configuration ===\n");
    println!("Version: {}", info.version);
    println!("Service: {}", info.service_name);

    println!("\nTransport:");
    println!("  Name: {}", info.transport.name);
    println!("  Type: {}", info.transport.transport_type);
    for (key, value) in &info.transport.params {
        println!("  {}: {}", key, value);
    }

    println!("\nRetry:");
    println!("  Base delay: {} ms", info.retry.base_delay_ms);
    println!("  Max delay: {} ms", info.retry.max_delay_ms);
    println!("  Jitter ratio: {}", info.retry.jitter_ratio);
    let schedule: Vec<String> = info
        .retry
        .backoff_schedule_ms
        .iter()
        .map(|ms| ms.to_string())
        .collect();
    println!("  Backoff schedule (ms): {}", schedule.join(", "));

    println!("\nShutdown grace: {} ms", info.shutdown_timeout_ms);

    println!("\nLoad:");
    println!("  Batches: {}", info.load.batches);
    println!("  Records per batch: {}", info.load.records_per_batch);
    println!("  Record kind: {}", info.load.record_kind);

    println!();
}
