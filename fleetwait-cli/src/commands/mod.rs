//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod classify;
mod status;
mod wait;

pub use classify::ClassifyArgs;
pub use status::StatusArgs;
pub use wait::WaitArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Wait until every static node is up
    Wait(WaitArgs),
    /// Poll node status once and show the decision
    Status(StatusArgs),
    /// Evaluate saved node status output offline
    Classify(ClassifyArgs),
}

impl Commands {
    /// Whether the command keeps running and should log progress
    pub fn is_long_running(&self) -> bool {
        matches!(self, Commands::Wait(_))
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Wait(args) => wait::handle_wait_command(args, config).await,
        Commands::Status(args) => status::handle_status_command(args, config).await,
        Commands::Classify(args) => classify::handle_classify_command(args, config).await,
    }
}
