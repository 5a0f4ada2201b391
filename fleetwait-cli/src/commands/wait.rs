//! Wait command handler
//!
//! Runs the heartbeat check and the poll loop, like the runner binary, but
//! with settings taken from the command line.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use fleetwait_runner::scheduler::FleetPoller;
use fleetwait_runner::service::{
    FileHeartbeatService, HeartbeatService, TokioSleeper, shutdown_signal,
};
use fleetwait_runner::{SinfoFetcher, WaitError};

/// Arguments of the wait command
#[derive(Args)]
pub struct WaitArgs {
    /// Give up after this many seconds even if only capacity errors remain
    #[arg(long, env = "MAX_WAIT")]
    max_wait: Option<u64>,

    /// Do not wait for the management daemon heartbeat first
    #[arg(long)]
    skip_heartbeat: bool,

    /// Heartbeat attempts before giving up
    #[arg(long, env = "HEARTBEAT_RETRIES", default_value_t = 30)]
    heartbeat_retries: u32,

    /// Seconds between heartbeat attempts
    #[arg(long, env = "HEARTBEAT_RETRY_DELAY", default_value_t = 10)]
    heartbeat_retry_delay: u64,
}

/// Handle the wait command
///
/// # Arguments
/// * `args` - Wait options
/// * `config` - The CLI configuration
pub async fn handle_wait_command(args: WaitArgs, config: &Config) -> Result<()> {
    let mut runner_config = config.runner_config()?;
    if let Some(secs) = args.max_wait {
        runner_config = runner_config.with_max_wait(Duration::from_secs(secs));
        runner_config.validate()?;
    }

    if !args.skip_heartbeat {
        FileHeartbeatService::new(&runner_config.heartbeat_file)
            .wait_until_available(
                &TokioSleeper,
                args.heartbeat_retries,
                Duration::from_secs(args.heartbeat_retry_delay),
            )
            .await
            .context("Management daemon heartbeat is not available")?;
    }

    let fetcher = Arc::new(SinfoFetcher::new(
        runner_config.sinfo_path(),
        runner_config.policy.node_pattern.clone(),
    ));
    let poller = FleetPoller::with_system_time(runner_config, fetcher)?;

    match poller.run_until(shutdown_signal()).await {
        Ok(ready) => {
            println!(
                "{}",
                format!(
                    "Static fleet is ready ({} poll(s), waited {}s)",
                    ready.polls,
                    ready.waited.as_secs()
                )
                .green()
                .bold()
            );
            Ok(())
        }
        Err(WaitError::Cancelled) => {
            println!("{}", "Wait cancelled.".yellow());
            Err(WaitError::Cancelled.into())
        }
        Err(e) => Err(e.into()),
    }
}
