//! Fleet poller
//!
//! Repeatedly fetches node status, classifies it and decides whether the
//! static fleet is ready. Each cycle starts from a fresh snapshot; the only
//! state carried between cycles is the poll count and the start time used
//! for the optional overall deadline.

use chrono::{DateTime, Utc};
use fleetwait_core::{
    Classification, Decision, PolicyError, Snapshot, StatusParser, classify, downtime, evaluate,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Result, WaitError};
use crate::repository::StatusFetcher;
use crate::service::{Clock, Sleeper, SystemClock, TokioSleeper};

/// Everything observed during one poll cycle
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Time used to evaluate the snapshot
    pub observed_at: DateTime<Utc>,
    pub snapshot: Snapshot,
    pub classification: Classification,
    pub decision: Decision,
}

/// Successful end of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetReady {
    /// Number of status polls made, the final one included
    pub polls: u32,
    /// Time between the first and the final poll
    pub waited: Duration,
}

/// Poller that waits until every static node is up
pub struct FleetPoller {
    config: Config,
    parser: StatusParser,
    fetcher: Arc<dyn StatusFetcher>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl FleetPoller {
    /// Creates a new fleet poller
    ///
    /// # Arguments
    /// * `config` - Timeout, poll interval and parsing policy
    /// * `fetcher` - Runs the node status query
    /// * `clock` - Source of the current time
    /// * `sleeper` - Waits between polls
    pub fn new(
        config: Config,
        fetcher: Arc<dyn StatusFetcher>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> std::result::Result<Self, PolicyError> {
        let parser = StatusParser::new(config.policy.clone())?;
        Ok(Self {
            config,
            parser,
            fetcher,
            clock,
            sleeper,
        })
    }

    /// Creates a poller using the system clock and the tokio timer
    pub fn with_system_time(
        config: Config,
        fetcher: Arc<dyn StatusFetcher>,
    ) -> std::result::Result<Self, PolicyError> {
        Self::new(config, fetcher, Arc::new(SystemClock), Arc::new(TokioSleeper))
    }

    /// Performs a single fetch, parse, classify and evaluate cycle
    ///
    /// A timed out node is reported in the returned decision, not as an
    /// error. Fetch failures and, with strict parsing, parse failures are
    /// returned as errors.
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        let raw = self.fetcher.fetch().await?;
        info!("Static fleet status:\n{}", raw.trim());

        let snapshot = self.parser.parse(&raw)?;
        let classification = classify(&snapshot, self.parser.policy());
        let observed_at = self.clock.now();

        for node in &classification.other_down {
            if let Some(elapsed) = downtime(node, observed_at) {
                info!(
                    "Node {} has been down for {} seconds with status {}",
                    node.name,
                    elapsed.as_secs(),
                    node.reason.as_deref().unwrap_or(&node.state)
                );
            }
        }

        let decision = evaluate(&classification, observed_at, self.config.static_fleet_timeout);
        debug!("Poll decision: {}", decision);

        Ok(PollOutcome {
            observed_at,
            snapshot,
            classification,
            decision,
        })
    }

    /// Polls until the fleet is ready or the wait fails
    pub async fn run(&self) -> Result<FleetReady> {
        info!(
            "Waiting for static fleet (timeout: {:?}, interval: {:?})",
            self.config.static_fleet_timeout, self.config.poll_interval
        );

        let started = self.clock.now();
        let mut polls = 0;

        loop {
            polls += 1;
            let outcome = self.poll_once().await?;
            let waited = (outcome.observed_at - started)
                .to_std()
                .unwrap_or(Duration::ZERO);

            match outcome.decision {
                Decision::Ready => {
                    info!("Static fleet capacity is ready");
                    return Ok(FleetReady { polls, waited });
                }
                Decision::FatalTimeout { node, elapsed } => {
                    error!(
                        "Node {} has been down for {}s, more than the {}s allowed",
                        node,
                        elapsed.as_secs(),
                        self.config.static_fleet_timeout.as_secs()
                    );
                    return Err(WaitError::Timeout { node, elapsed });
                }
                Decision::KeepWaiting => {
                    let classification = &outcome.classification;
                    info!(
                        "{} node(s) up, {} with capacity errors, {} down, {} unreadable",
                        classification.up_count,
                        classification.capacity_errors.len(),
                        classification.other_down.len(),
                        classification.unreadable_lines
                    );

                    if let Some(max_wait) = self.config.max_wait {
                        if waited >= max_wait {
                            error!("Static fleet still not ready after {:?}", waited);
                            return Err(WaitError::DeadlineExceeded { waited });
                        }
                    }

                    info!("Waiting for static fleet capacity provisioning");
                    self.sleeper.sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    /// Like [`run`](Self::run), but gives up as soon as `shutdown` completes
    pub async fn run_until<F>(&self, shutdown: F) -> Result<FleetReady>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;

            _ = shutdown => {
                warn!("Shutdown requested, abandoning wait for static fleet");
                Err(WaitError::Cancelled)
            }
            result = self.run() => result,
        }
    }
}
