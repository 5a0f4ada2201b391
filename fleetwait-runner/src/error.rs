//! Error types for the fleet waiter

use fleetwait_core::ParseError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for wait operations
pub type Result<T> = std::result::Result<T, WaitError>;

/// Errors raised while running the node status query
#[derive(Debug, Error)]
pub enum FetchError {
    /// The command could not be started
    #[error("failed to run status command: {0}")]
    Spawn(#[from] std::io::Error),

    /// The command ran but exited unsuccessfully
    #[error("status command exited with code {code}: {stderr}")]
    NonZeroExit {
        /// Exit code, -1 when terminated by a signal
        code: i32,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// The command printed something that is not text
    #[error("status command output is not valid UTF-8")]
    InvalidOutput,
}

/// Reasons the wait for the static fleet ends without the fleet being ready
#[derive(Debug, Error)]
pub enum WaitError {
    /// Node status could not be fetched
    #[error("failed to fetch static fleet status: {0}")]
    Fetch(#[from] FetchError),

    /// Node status could not be parsed
    #[error("failed to parse static fleet status: {0}")]
    Parse(#[from] ParseError),

    /// A node stayed down for longer than the configured timeout
    #[error(
        "Timed out waiting for static compute fleet to start: node {node} has been down for {}s",
        .elapsed.as_secs()
    )]
    Timeout { node: String, elapsed: Duration },

    /// The overall deadline passed while nodes were still down
    #[error("static compute fleet not ready after {}s", .waited.as_secs())]
    DeadlineExceeded { waited: Duration },

    /// The wait was interrupted from outside
    #[error("wait for static compute fleet was cancelled")]
    Cancelled,

    /// The cluster management heartbeat never appeared
    #[error("heartbeat file {} not available after {attempts} attempt(s)", .path.display())]
    HeartbeatUnavailable { path: PathBuf, attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = WaitError::Timeout {
            node: "compute-st-c5-1".to_string(),
            elapsed: Duration::from_secs(7200),
        };
        assert_eq!(
            err.to_string(),
            "Timed out waiting for static compute fleet to start: node compute-st-c5-1 has been down for 7200s"
        );
    }

    #[test]
    fn test_fetch_error_message() {
        let err = WaitError::from(FetchError::NonZeroExit {
            code: 127,
            stderr: "sinfo: command not found".to_string(),
        });
        assert!(err.to_string().contains("code 127"));
        assert!(err.to_string().contains("command not found"));
    }

    #[test]
    fn test_heartbeat_message() {
        let err = WaitError::HeartbeatUnavailable {
            path: PathBuf::from("/opt/slurm/hb"),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "heartbeat file /opt/slurm/hb not available after 3 attempt(s)"
        );
    }
}
