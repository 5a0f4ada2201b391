//! Configuration module
//!
//! Handles CLI settings shared by every command and turns them into the
//! runner's configuration.

use anyhow::{Context, Result};
use fleetwait_runner::config::{Config as RunnerConfig, parse_naive_offset};
use std::path::PathBuf;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Scheduler install prefix
    pub slurm_install_dir: PathBuf,

    /// Node timeout in seconds
    pub timeout_secs: u64,

    /// Poll interval in seconds
    pub poll_interval_secs: u64,

    /// Fail on malformed status lines
    pub strict: bool,

    /// Offset for naive timestamps, as given on the command line
    pub naive_offset: String,
}

impl Config {
    /// Builds and validates the runner configuration
    pub fn runner_config(&self) -> Result<RunnerConfig> {
        let mut config = RunnerConfig::new(
            self.slurm_install_dir.clone(),
            Duration::from_secs(self.timeout_secs),
        )
        .with_strict_parsing(self.strict);

        config.poll_interval = Duration::from_secs(self.poll_interval_secs);
        config.policy.naive_offset =
            parse_naive_offset(&self.naive_offset).context("Invalid --naive-offset")?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use fleetwait_core::MalformedLinePolicy;

    fn config() -> Config {
        Config {
            slurm_install_dir: PathBuf::from("/opt/slurm"),
            timeout_secs: 600,
            poll_interval_secs: 5,
            strict: true,
            naive_offset: "+01:00".to_string(),
        }
    }

    #[test]
    fn test_runner_config() {
        let runner = config().runner_config().unwrap();
        assert_eq!(runner.static_fleet_timeout, Duration::from_secs(600));
        assert_eq!(runner.poll_interval, Duration::from_secs(5));
        assert_eq!(runner.policy.malformed_lines, MalformedLinePolicy::Fail);
        assert_eq!(runner.policy.naive_offset, FixedOffset::east_opt(3600));
    }

    #[test]
    fn test_runner_config_rejects_bad_values() {
        let mut bad = config();
        bad.naive_offset = "later".to_string();
        assert!(bad.runner_config().is_err());

        let mut bad = config();
        bad.timeout_secs = 0;
        assert!(bad.runner_config().is_err());
    }
}
