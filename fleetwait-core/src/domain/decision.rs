//! Classification and decision types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::node::NodeStatus;

/// Down nodes of one snapshot, split by failure kind
///
/// Both lists keep the order in which nodes appeared in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Nodes down because the provider could not allocate capacity
    pub capacity_errors: Vec<NodeStatus>,

    /// Nodes down for any other reason, subject to the timeout
    pub other_down: Vec<NodeStatus>,

    /// Number of nodes in an up-state
    pub up_count: usize,

    /// Static node lines that could not be read
    ///
    /// Such a node may still be booting, so the fleet is never up while any
    /// line was unreadable.
    #[serde(default)]
    pub unreadable_lines: usize,
}

impl Classification {
    /// Returns true when no node is down and every line was readable
    pub fn all_up(&self) -> bool {
        self.capacity_errors.is_empty()
            && self.other_down.is_empty()
            && self.unreadable_lines == 0
    }

    /// Total number of nodes in the snapshot
    pub fn total(&self) -> usize {
        self.up_count + self.capacity_errors.len() + self.other_down.len()
    }

    pub fn capacity_error_names(&self) -> Vec<&str> {
        self.capacity_errors.iter().map(|n| n.name.as_str()).collect()
    }

    pub fn other_down_names(&self) -> Vec<&str> {
        self.other_down.iter().map(|n| n.name.as_str()).collect()
    }
}

/// Outcome of evaluating one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Every static node is up
    Ready,

    /// Some nodes are down but none has exceeded the timeout
    KeepWaiting,

    /// A node has been down for longer than the timeout
    FatalTimeout {
        /// Name of the first node found past the timeout
        node: String,
        /// How long the node has been down
        elapsed: Duration,
    },
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Ready => write!(f, "Ready"),
            Decision::KeepWaiting => write!(f, "KeepWaiting"),
            Decision::FatalTimeout { node, elapsed } => {
                write!(f, "FatalTimeout({}, {}s)", node, elapsed.as_secs())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_display() {
        let decision = Decision::FatalTimeout {
            node: "compute-st-c5-1".to_string(),
            elapsed: Duration::from_secs(7200),
        };
        assert_eq!(decision.to_string(), "FatalTimeout(compute-st-c5-1, 7200s)");
    }

    #[test]
    fn test_empty_classification_is_all_up() {
        let classification = Classification::default();
        assert!(classification.all_up());
        assert_eq!(classification.total(), 0);
    }

    #[test]
    fn test_unreadable_lines_are_not_all_up() {
        let classification = Classification {
            unreadable_lines: 1,
            ..Classification::default()
        };
        assert!(!classification.all_up());
    }
}
