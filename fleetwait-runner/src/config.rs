//! Runner configuration
//!
//! Defines all configurable parameters for the fleet waiter: where the
//! scheduler is installed, how long static nodes may stay down, how often
//! to poll and how to read the scheduler's output.

use anyhow::Context;
use chrono::FixedOffset;
use fleetwait_core::{FleetPolicy, MalformedLinePolicy};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default scheduler install prefix
pub const DEFAULT_SLURM_INSTALL_DIR: &str = "/opt/slurm";

/// Heartbeat file of the cluster management daemon, relative to the install prefix
const HEARTBEAT_RELATIVE_PATH: &str = "etc/pcluster/.slurm_plugin/clustermgtd_heartbeat";

/// Runner configuration
///
/// Timeouts and intervals are configurable per cluster. Defaults match
/// what head-node finalization expects.
#[derive(Debug, Clone)]
pub struct Config {
    /// Scheduler install prefix (contains `bin/sinfo`)
    pub slurm_install_dir: PathBuf,

    /// How long a node may stay down, for reasons other than capacity, before
    /// the wait fails
    pub static_fleet_timeout: Duration,

    /// Delay between two status polls
    pub poll_interval: Duration,

    /// Upper bound on the whole wait, capacity errors included
    pub max_wait: Option<Duration>,

    /// File whose presence shows the cluster management daemon is running
    pub heartbeat_file: PathBuf,

    /// Attempts made to find the heartbeat file
    pub heartbeat_retries: u32,

    /// Delay between two heartbeat attempts
    pub heartbeat_retry_delay: Duration,

    /// Parsing and classification rules
    pub policy: FleetPolicy,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(slurm_install_dir: impl Into<PathBuf>, static_fleet_timeout: Duration) -> Self {
        let slurm_install_dir = slurm_install_dir.into();
        let heartbeat_file = slurm_install_dir.join(HEARTBEAT_RELATIVE_PATH);
        Self {
            slurm_install_dir,
            static_fleet_timeout,
            poll_interval: Duration::from_secs(15),
            max_wait: None,
            heartbeat_file,
            heartbeat_retries: 30,
            heartbeat_retry_delay: Duration::from_secs(10),
            policy: FleetPolicy::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - STATIC_FLEET_TIMEOUT (required, seconds)
    /// - SLURM_INSTALL_DIR (optional, default: /opt/slurm)
    /// - POLL_INTERVAL (optional, seconds, default: 15)
    /// - MAX_WAIT (optional, seconds, default: unbounded)
    /// - HEARTBEAT_FILE (optional, default: under SLURM_INSTALL_DIR)
    /// - HEARTBEAT_RETRIES (optional, default: 30)
    /// - HEARTBEAT_RETRY_DELAY (optional, seconds, default: 10)
    /// - UP_STATES (optional, comma separated, default: idle,alloc,mix)
    /// - CAPACITY_ERROR_CODES (optional, comma separated)
    /// - STRICT_PARSING (optional, true/false, default: false)
    /// - NAIVE_TIMESTAMP_OFFSET (optional, e.g. +00:00, or "none")
    ///
    /// Returns `Ok(None)` when STATIC_FLEET_TIMEOUT is not set. Any variable
    /// that is set but cannot be parsed is an error.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(timeout) = parse_var::<u64>(&lookup, "STATIC_FLEET_TIMEOUT")? else {
            return Ok(None);
        };

        let slurm_install_dir =
            lookup("SLURM_INSTALL_DIR").unwrap_or_else(|| DEFAULT_SLURM_INSTALL_DIR.to_string());

        let mut config = Self::new(slurm_install_dir, Duration::from_secs(timeout));

        if let Some(secs) = parse_var::<u64>(&lookup, "POLL_INTERVAL")? {
            config.poll_interval = Duration::from_secs(secs);
        }

        config.max_wait = parse_var::<u64>(&lookup, "MAX_WAIT")?.map(Duration::from_secs);

        if let Some(path) = lookup("HEARTBEAT_FILE") {
            config.heartbeat_file = PathBuf::from(path);
        }

        if let Some(retries) = parse_var::<u32>(&lookup, "HEARTBEAT_RETRIES")? {
            config.heartbeat_retries = retries;
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "HEARTBEAT_RETRY_DELAY")? {
            config.heartbeat_retry_delay = Duration::from_secs(secs);
        }

        if let Some(states) = lookup("UP_STATES") {
            config.policy.up_states = split_list(&states);
        }

        if let Some(codes) = lookup("CAPACITY_ERROR_CODES") {
            config.policy.capacity_error_codes = split_list(&codes);
        }

        if let Some(strict) = lookup("STRICT_PARSING") {
            let strict = parse_bool(&strict).context("invalid STRICT_PARSING")?;
            config = config.with_strict_parsing(strict);
        }

        if let Some(offset) = lookup("NAIVE_TIMESTAMP_OFFSET") {
            config.policy.naive_offset =
                parse_naive_offset(&offset).context("invalid NAIVE_TIMESTAMP_OFFSET")?;
        }

        Ok(Some(config))
    }

    /// Switches between failing and skipping on malformed status lines
    pub fn with_strict_parsing(mut self, strict: bool) -> Self {
        self.policy.malformed_lines = if strict {
            MalformedLinePolicy::Fail
        } else {
            MalformedLinePolicy::Skip
        };
        self
    }

    /// Sets an overall deadline for the wait
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Path to the node status command
    pub fn sinfo_path(&self) -> PathBuf {
        self.slurm_install_dir.join("bin").join("sinfo")
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.static_fleet_timeout.as_secs() == 0 {
            anyhow::bail!("static_fleet_timeout must be greater than 0");
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.slurm_install_dir.as_os_str().is_empty() {
            anyhow::bail!("slurm_install_dir cannot be empty");
        }

        // The path ends up single-quoted in a shell command
        if self.slurm_install_dir.to_string_lossy().contains('\'') {
            anyhow::bail!("slurm_install_dir cannot contain single quotes");
        }

        if self.policy.up_states.is_empty() {
            anyhow::bail!("up_states cannot be empty");
        }

        if let Some(max_wait) = self.max_wait {
            if max_wait < self.poll_interval {
                anyhow::bail!("max_wait must be at least one poll_interval");
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SLURM_INSTALL_DIR, Duration::from_secs(3600))
    }
}

/// Reads and parses one variable; unset is `None`, unparseable is an error
fn parse_var<T>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{} must be a number, got '{}': {}", key, value, e))
        })
        .transpose()
}

/// Splits a comma separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}

/// Parses an offset such as `+00:00`; `none` disables naive timestamps
pub fn parse_naive_offset(value: &str) -> anyhow::Result<Option<FixedOffset>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return Ok(FixedOffset::east_opt(0));
    }
    value
        .parse::<FixedOffset>()
        .map(Some)
        .map_err(|e| anyhow::anyhow!("invalid timestamp offset '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.heartbeat_retries, 30);
        assert_eq!(config.heartbeat_retry_delay, Duration::from_secs(10));
        assert_eq!(config.max_wait, None);
        assert_eq!(config.sinfo_path(), PathBuf::from("/opt/slurm/bin/sinfo"));
        assert_eq!(
            config.heartbeat_file,
            PathBuf::from("/opt/slurm/etc/pcluster/.slurm_plugin/clustermgtd_heartbeat")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.static_fleet_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.static_fleet_timeout = Duration::from_secs(60);

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.poll_interval = Duration::from_secs(15);

        config.slurm_install_dir = PathBuf::from("/opt/it's");
        assert!(config.validate().is_err());
        config.slurm_install_dir = PathBuf::from("/opt/slurm");

        config = config.with_max_wait(Duration::from_secs(5));
        assert!(config.validate().is_err());
        config = config.with_max_wait(Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_parsing() {
        let config = Config::default().with_strict_parsing(true);
        assert_eq!(config.policy.malformed_lines, MalformedLinePolicy::Fail);
        let config = config.with_strict_parsing(false);
        assert_eq!(config.policy.malformed_lines, MalformedLinePolicy::Skip);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("idle, alloc,,mix "), vec!["idle", "alloc", "mix"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_parse_naive_offset() {
        assert_eq!(parse_naive_offset("none").unwrap(), None);
        assert_eq!(parse_naive_offset("UTC").unwrap(), FixedOffset::east_opt(0));
        assert_eq!(
            parse_naive_offset("+02:00").unwrap(),
            FixedOffset::east_opt(7200)
        );
        assert!(parse_naive_offset("soon").is_err());
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_without_timeout() {
        let config = Config::from_lookup(lookup(&[("POLL_INTERVAL", "30")])).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let config = Config::from_lookup(lookup(&[
            ("STATIC_FLEET_TIMEOUT", "600"),
            ("SLURM_INSTALL_DIR", "/opt/sched"),
            ("POLL_INTERVAL", "30"),
            ("MAX_WAIT", "7200"),
            ("HEARTBEAT_RETRIES", "5"),
            ("STRICT_PARSING", "yes"),
            ("NAIVE_TIMESTAMP_OFFSET", "none"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.static_fleet_timeout, Duration::from_secs(600));
        assert_eq!(config.sinfo_path(), PathBuf::from("/opt/sched/bin/sinfo"));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.max_wait, Some(Duration::from_secs(7200)));
        assert_eq!(config.heartbeat_retries, 5);
        assert_eq!(config.policy.malformed_lines, MalformedLinePolicy::Fail);
        assert_eq!(config.policy.naive_offset, None);
    }

    #[test]
    fn test_from_lookup_rejects_invalid_timeout() {
        let result = Config::from_lookup(lookup(&[("STATIC_FLEET_TIMEOUT", "1h")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_rejects_invalid_optional_values() {
        for (key, value) in [
            ("POLL_INTERVAL", "abc"),
            ("MAX_WAIT", "-1"),
            ("HEARTBEAT_RETRIES", "many"),
            ("HEARTBEAT_RETRY_DELAY", "10s"),
            ("STRICT_PARSING", "maybe"),
            ("NAIVE_TIMESTAMP_OFFSET", "soon"),
        ] {
            let result =
                Config::from_lookup(lookup(&[("STATIC_FLEET_TIMEOUT", "600"), (key, value)]));
            let err = result.expect_err(key);
            assert!(err.to_string().contains(key), "{}: {}", key, err);
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("YES").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
