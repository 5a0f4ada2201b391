//! Scheduler layer for the runner
//!
//! This layer drives the wait for the static fleet: it polls node status at
//! a fixed interval and stops once the fleet is ready, a node has been down
//! for too long, or the caller gives up.

pub mod poller;

pub use poller::{FleetPoller, FleetReady, PollOutcome};
