//! Heartbeat service
//!
//! The cluster management daemon periodically rewrites a heartbeat file.
//! Polling the fleet only makes sense once that file exists, so the runner
//! waits for it first, with a bounded number of attempts.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::clock::Sleeper;
use crate::error::WaitError;

/// Service trait for checking the management daemon heartbeat
#[async_trait]
pub trait HeartbeatService: Send + Sync {
    /// Checks once whether the heartbeat is available
    async fn check(&self) -> std::io::Result<()>;

    /// Where the heartbeat is read from, for error reporting
    fn location(&self) -> PathBuf;

    /// Checks the heartbeat until it is available or attempts run out
    ///
    /// # Arguments
    /// * `sleeper` - Used to wait between attempts
    /// * `attempts` - Maximum number of checks, at least one is always made
    /// * `delay` - Delay between two checks
    async fn wait_until_available(
        &self,
        sleeper: &dyn Sleeper,
        attempts: u32,
        delay: Duration,
    ) -> Result<(), WaitError> {
        let attempts = attempts.max(1);

        for attempt in 1..=attempts {
            match self.check().await {
                Ok(()) => {
                    if attempt > 1 {
                        info!("Heartbeat available after {} attempt(s)", attempt);
                    }
                    return Ok(());
                }
                Err(e) if attempt < attempts => {
                    warn!(
                        "Heartbeat not available (attempt {}/{}): {}",
                        attempt, attempts, e
                    );
                    sleeper.sleep(delay).await;
                }
                Err(e) => {
                    warn!(
                        "Heartbeat not available (attempt {}/{}): {}",
                        attempt, attempts, e
                    );
                }
            }
        }

        Err(WaitError::HeartbeatUnavailable {
            path: self.location(),
            attempts,
        })
    }
}

/// Heartbeat read from a file on the local filesystem
pub struct FileHeartbeatService {
    path: PathBuf,
}

impl FileHeartbeatService {
    /// Creates a new file heartbeat service
    ///
    /// # Arguments
    /// * `path` - Heartbeat file written by the management daemon
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HeartbeatService for FileHeartbeatService {
    async fn check(&self) -> std::io::Result<()> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        info!("Heartbeat found at {}: {}", self.path.display(), content.trim());
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Heartbeat that appears after a number of failed checks
    struct EventualHeartbeat {
        failures: u32,
        checks: AtomicU32,
    }

    #[async_trait]
    impl HeartbeatService for EventualHeartbeat {
        async fn check(&self) -> std::io::Result<()> {
            let n = self.checks.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(std::io::Error::from(std::io::ErrorKind::NotFound))
            } else {
                Ok(())
            }
        }

        fn location(&self) -> PathBuf {
            PathBuf::from("/test/heartbeat")
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_heartbeat_after_retries() {
        let heartbeat = EventualHeartbeat {
            failures: 2,
            checks: AtomicU32::new(0),
        };
        let sleeper = RecordingSleeper::default();

        heartbeat
            .wait_until_available(&sleeper, 5, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(heartbeat.checks.load(Ordering::SeqCst), 3);
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![Duration::from_secs(10); 2]
        );
    }

    #[tokio::test]
    async fn test_heartbeat_gives_up() {
        let heartbeat = EventualHeartbeat {
            failures: u32::MAX,
            checks: AtomicU32::new(0),
        };
        let sleeper = RecordingSleeper::default();

        let err = heartbeat
            .wait_until_available(&sleeper, 3, Duration::from_secs(10))
            .await
            .unwrap_err();

        match err {
            WaitError::HeartbeatUnavailable { path, attempts } => {
                assert_eq!(path, PathBuf::from("/test/heartbeat"));
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(heartbeat.checks.load(Ordering::SeqCst), 3);
        // No sleep after the last attempt
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_file_heartbeat() {
        let path = std::env::temp_dir().join(format!("fleetwait-heartbeat-{}", std::process::id()));
        let service = FileHeartbeatService::new(&path);
        assert!(service.check().await.is_err());

        tokio::fs::write(&path, "2023-01-13 19:00:00.000000+00:00")
            .await
            .unwrap();
        assert!(service.check().await.is_ok());
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
