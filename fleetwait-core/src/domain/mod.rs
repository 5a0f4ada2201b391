//! Core domain types
//!
//! These types describe a single poll of the scheduler: the nodes it reported,
//! how they were classified and what the readiness decision was. Nothing here
//! outlives one poll cycle.

pub mod decision;
pub mod node;
