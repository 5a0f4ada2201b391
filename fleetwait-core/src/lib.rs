//! Fleetwait Core
//!
//! Core types and decision logic for waiting on a static compute fleet.
//!
//! This crate contains:
//! - Domain types: node status snapshots, classifications and decisions
//! - Policy: up-states, capacity error codes and parsing rules
//! - Parser: turns raw scheduler output into node records
//! - Classifier: splits down nodes into capacity errors and other failures
//! - Evaluator: decides whether the fleet is ready, pending or timed out
//!
//! Nothing in here performs I/O. Fetching status and sleeping between polls
//! live in the runner.

pub mod classifier;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod policy;

pub use classifier::classify;
pub use domain::decision::{Classification, Decision};
pub use domain::node::{NodeStatus, Snapshot};
pub use error::{ParseError, PolicyError, Result};
pub use evaluator::{downtime, evaluate};
pub use parser::StatusParser;
pub use policy::{FleetPolicy, MalformedLinePolicy};
