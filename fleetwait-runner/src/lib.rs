//! Fleetwait Runner
//!
//! Waits for the static compute fleet of a cluster to come up.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Repositories: Run the scheduler's node status query
//! - Services: Clock, sleep and management daemon heartbeat
//! - Scheduler: The poll loop deciding when the fleet is ready
//!
//! Used by the `fleetwait-runner` binary during head-node finalization and
//! by the `fleetwait` operator CLI.

pub mod config;
pub mod error;
pub mod repository;
pub mod scheduler;
pub mod service;

pub use config::Config;
pub use error::{FetchError, Result, WaitError};
pub use repository::{SinfoFetcher, StatusFetcher};
pub use scheduler::{FleetPoller, FleetReady, PollOutcome};
