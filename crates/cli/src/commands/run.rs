//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{error, info, warn};

use super::load_config;
use crate::cli::RunArgs;
use crate::load::{LoadRunConfig, LoadRunner};

/// Execute the `run` command
pub async fn run_load(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(batches) = args.batches {
        info!(batches, "Overriding batch count from CLI");
        config.load.batches = batches;
    }
    if let Some(records) = args.records_per_batch {
        info!(records, "Overriding records per batch from CLI");
        config.load.records_per_batch = records;
    }
    // overrides must obey the same rules as the file
    config_loader::ConfigLoader::validate(&config).context("Invalid CLI overrides")?;

    info!(
        service = %config.service_name,
        transport = %config.transport.name,
        transport_type = ?config.transport.transport_type,
        batches = config.load.batches,
        records_per_batch = config.load.records_per_batch,
        kind = %config.load.record_kind,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let runner = LoadRunner::new(LoadRunConfig {
        config,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting load run...");
    let stats = runner
        .run(shutdown_signal())
        .await
        .context("Load run failed")?;

    info!(
        records = stats.records,
        delivered = stats.delivery.records.delivered,
        failed = stats.delivery.records.failed,
        cancelled = stats.delivery.records.cancelled,
        duration_secs = stats.duration.as_secs_f64(),
        "Load run finished"
    );
    stats.print_summary();

    if stats.timed_out {
        warn!("Some batches were still in flight when the timeout expired");
    }

    info!("Telemetry Sender finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::SenderConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Service: {}", config.service_name);

    println!("\nTransport:");
    println!(
        "  {} ({:?})",
        config.transport.name, config.transport.transport_type
    );
    let mut params: Vec<_> = config.transport.params.iter().collect();
    params.sort();
    for (key, value) in params {
        println!("    {} = {}", key, value);
    }

    println!("\nRetry:");
    println!("  Base delay: {} ms", config.retry.base_delay_ms);
    println!("  Max delay: {} ms", config.retry.max_delay_ms);
    println!("  Jitter: {:.0}%", config.retry.jitter_ratio * 100.0);
    println!("  Shutdown grace: {} ms", config.shutdown.timeout_ms);

    println!("\nLoad:");
    println!(
        "  {} batches x {} {} records",
        config.load.batches, config.load.records_per_batch, config.load.record_kind
    );

    println!();
}
