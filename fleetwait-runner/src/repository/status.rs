//! Node status repository
//!
//! Runs the scheduler's node listing and returns its raw output:
//! - One line per static node: `<name> <state> <down-since> <reason>`
//! - Dynamic nodes are filtered out by the query itself
//! - No retries; a failing command is reported as is

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::error::FetchError;

/// Output format passed to sinfo: node name, compact state, reason time, reason
const SINFO_FORMAT: &str = "%N %t %H %E";

/// Repository trait for fetching raw node status
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Runs the status query once
    ///
    /// # Returns
    /// The command's standard output, possibly empty
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// sinfo implementation of StatusFetcher
///
/// The listing is piped through `grep -E` so that only static node names
/// reach the parser. `pipefail` keeps a failing sinfo from being hidden by
/// the pipe, and `|| true` keeps an empty match from counting as a failure.
pub struct SinfoFetcher {
    sinfo: PathBuf,
    node_pattern: String,
}

impl SinfoFetcher {
    /// Creates a new sinfo fetcher
    ///
    /// # Arguments
    /// * `sinfo` - Path to the sinfo binary (e.g., /opt/slurm/bin/sinfo)
    /// * `node_pattern` - Unanchored extended regex matching static node names
    pub fn new(sinfo: impl Into<PathBuf>, node_pattern: impl Into<String>) -> Self {
        Self {
            sinfo: sinfo.into(),
            node_pattern: node_pattern.into(),
        }
    }

    /// Builds the shell pipeline run by [`fetch`](StatusFetcher::fetch)
    pub fn script(&self) -> String {
        format!(
            "set -o pipefail && '{}' -N -h -o '{}' | {{ grep -E '^{} .*' || true; }}",
            self.sinfo.display(),
            SINFO_FORMAT,
            self.node_pattern
        )
    }
}

#[async_trait]
impl StatusFetcher for SinfoFetcher {
    async fn fetch(&self) -> Result<String, FetchError> {
        let script = self.script();
        debug!("Running status query: {}", script);

        let output = Command::new("/bin/bash")
            .arg("-c")
            .arg(&script)
            .output()
            .await?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!("Status query failed: exit_code={} stderr='{}'", code, stderr);
            return Err(FetchError::NonZeroExit { code, stderr });
        }

        String::from_utf8(output.stdout).map_err(|_| FetchError::InvalidOutput)
    }
}
