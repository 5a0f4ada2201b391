//! Fleetwait Runner
//!
//! Blocks head-node finalization until the static compute fleet is up.
//!
//! The runner first waits for the cluster management daemon's heartbeat,
//! then polls node status until every static node is up. It exits with an
//! error if a node stays down, for reasons other than missing capacity,
//! longer than the configured timeout.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetwait_runner::config::Config;
use fleetwait_runner::repository::SinfoFetcher;
use fleetwait_runner::scheduler::FleetPoller;
use fleetwait_runner::service::{
    FileHeartbeatService, HeartbeatService, TokioSleeper, shutdown_signal,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetwait_runner=info,fleetwait_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fleetwait Runner");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: slurm_install_dir={}, static_fleet_timeout={:?}, poll_interval={:?}",
        config.slurm_install_dir.display(),
        config.static_fleet_timeout,
        config.poll_interval
    );

    // Wait for the management daemon before looking at nodes
    info!(
        "Checking management daemon heartbeat at {}",
        config.heartbeat_file.display()
    );
    FileHeartbeatService::new(&config.heartbeat_file)
        .wait_until_available(
            &TokioSleeper,
            config.heartbeat_retries,
            config.heartbeat_retry_delay,
        )
        .await
        .context("Management daemon heartbeat is not available")?;

    let fetcher = Arc::new(SinfoFetcher::new(
        config.sinfo_path(),
        config.policy.node_pattern.clone(),
    ));
    let poller = FleetPoller::with_system_time(config, fetcher)
        .context("Failed to create fleet poller")?;

    match poller.run_until(shutdown_signal()).await {
        Ok(ready) => {
            info!(
                "Static fleet ready after {} poll(s), waited {:?}",
                ready.polls, ready.waited
            );
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(e.into())
        }
    }
}

/// Loads configuration from environment variables
///
/// Falls back to defaults only when no timeout is configured. A variable
/// that is set but invalid stops the runner.
fn load_config() -> Result<Config> {
    let config = match Config::from_env().context("Invalid configuration in environment")? {
        Some(config) => config,
        None => {
            info!("STATIC_FLEET_TIMEOUT not set, using defaults");
            Config::default()
        }
    };
    config.validate()?;
    Ok(config)
}
