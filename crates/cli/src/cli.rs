//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telemetry Sender - batch delivery with adaptive retry
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-sender",
    author,
    version,
    about = "Telemetry batch sender with adaptive retry",
    long_about = "Dispatches telemetry batches (metrics, logs, spans) to a transport.\n\n\
                  Each batch is retried with exponential backoff or a server-requested \n\
                  wait, split in half when too large, and dropped on permanent failure."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_SENDER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_SENDER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch synthetic telemetry through the configured transport
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "sender.toml",
        env = "TELEMETRY_SENDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the number of batches from `[load]`
    #[arg(long, env = "TELEMETRY_SENDER_BATCHES")]
    pub batches: Option<usize>,

    /// Override records per batch from `[load]`
    #[arg(long)]
    pub records_per_batch: Option<usize>,

    /// Give up waiting for delivery after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TELEMETRY_SENDER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without dispatching
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TELEMETRY_SENDER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "sender.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "sender.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of backoff steps to preview
    #[arg(long, default_value = "8")]
    pub schedule: u32,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
