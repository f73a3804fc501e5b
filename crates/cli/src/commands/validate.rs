//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    service_name: String,
    transport: String,
    transport_type: String,
    base_delay_ms: u64,
    max_delay_ms: u64,
    shutdown_timeout_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match super::load_config(&args.config) {
        Ok(config) => {
            let warnings = config_loader::ConfigLoader::warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    service_name: config.service_name.clone(),
                    transport: config.transport.name.clone(),
                    transport_type: format!("{:?}", config.transport.transport_type),
                    base_delay_ms: config.retry.base_delay_ms,
                    max_delay_ms: config.retry.max_delay_ms,
                    shutdown_timeout_ms: config.shutdown.timeout_ms,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Service: {}", summary.service_name);
            println!(
                "  Transport: {} ({})",
                summary.transport, summary.transport_type
            );
            println!(
                "  Backoff: {} ms .. {} ms",
                summary.base_delay_ms, summary.max_delay_ms
            );
            println!("  Shutdown grace: {} ms", summary.shutdown_timeout_ms);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
