//! Time services
//!
//! The poll loop never reads the system clock or sleeps directly. Both go
//! through these traits so tests can drive time by hand.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Returns the current time in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Suspends the caller between polls
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleeps for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
