//! Status command handler
//!
//! Polls node status once and shows how each static node is classified and
//! what the poll loop would decide.

use anyhow::Result;
use clap::Args;
use std::sync::Arc;

use crate::config::Config;
use crate::report::Report;
use fleetwait_runner::SinfoFetcher;
use fleetwait_runner::scheduler::FleetPoller;

/// Arguments of the status command
#[derive(Args)]
pub struct StatusArgs {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// Handle the status command
///
/// # Arguments
/// * `args` - Output options
/// * `config` - The CLI configuration
pub async fn handle_status_command(args: StatusArgs, config: &Config) -> Result<()> {
    let runner_config = config.runner_config()?;
    let fetcher = Arc::new(SinfoFetcher::new(
        runner_config.sinfo_path(),
        runner_config.policy.node_pattern.clone(),
    ));
    let policy = runner_config.policy.clone();
    let timeout = runner_config.static_fleet_timeout;
    let poller = FleetPoller::with_system_time(runner_config, fetcher)?;

    let outcome = poller.poll_once().await?;
    let report = Report::new(&outcome, &policy, timeout);

    if args.json {
        report.print_json()?;
    } else {
        report.print();
    }

    Ok(())
}
