//! Fleetwait CLI
//!
//! Operator command-line interface for inspecting and waiting on the static
//! compute fleet.

mod commands;
mod config;
mod report;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fleetwait")]
#[command(about = "Static compute fleet readiness tool", long_about = None)]
struct Cli {
    /// Scheduler install prefix
    #[arg(long, env = "SLURM_INSTALL_DIR", default_value = "/opt/slurm")]
    slurm_install_dir: PathBuf,

    /// Seconds a node may stay down, capacity errors excepted
    #[arg(long, env = "STATIC_FLEET_TIMEOUT", default_value_t = 3600)]
    timeout: u64,

    /// Seconds between two status polls
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 15)]
    poll_interval: u64,

    /// Fail on malformed status lines instead of skipping them
    #[arg(long, env = "STRICT_PARSING")]
    strict: bool,

    /// Offset for timestamps printed without one, or "none" to reject them
    #[arg(long, env = "NAIVE_TIMESTAMP_OFFSET", default_value = "+00:00")]
    naive_offset: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Waiting logs progress; one-shot commands only surface warnings
    let default_filter = if cli.command.is_long_running() {
        "fleetwait_runner=info,fleetwait_core=info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config {
        slurm_install_dir: cli.slurm_install_dir,
        timeout_secs: cli.timeout,
        poll_interval_secs: cli.poll_interval,
        strict: cli.strict,
        naive_offset: cli.naive_offset,
    };

    handle_command(cli.command, &config).await
}
