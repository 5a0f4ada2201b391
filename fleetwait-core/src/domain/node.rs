//! Node status domain model
//!
//! Represents one static compute node as reported by a single scheduler poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a single static node in one poll snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Node name, e.g. `compute-st-c5-1`
    pub name: String,

    /// Short state code reported by the scheduler (`idle`, `down~`, `mix`, ...)
    pub state: String,

    /// When the node entered its current non-ready state
    ///
    /// Only set for down nodes. This timestamp is the source of truth for
    /// how long a node has been unavailable.
    pub down_since: Option<DateTime<Utc>>,

    /// Free-form reason reported for a down node
    ///
    /// Capacity failures start with `(Code:<CODE>)`.
    pub reason: Option<String>,
}

impl NodeStatus {
    /// Creates a status record for a node in an up-state
    pub fn up(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            down_since: None,
            reason: None,
        }
    }

    /// Creates a status record for a node in a down state
    pub fn down(
        name: impl Into<String>,
        state: impl Into<String>,
        down_since: DateTime<Utc>,
        reason: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            down_since: Some(down_since),
            reason,
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.state)
    }
}

/// The static nodes seen in one poll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Parsed nodes, in the order the scheduler printed them
    pub nodes: Vec<NodeStatus>,

    /// Number of malformed lines dropped while parsing
    pub skipped_lines: usize,
}

impl Snapshot {
    pub fn new(nodes: Vec<NodeStatus>) -> Self {
        Self {
            nodes,
            skipped_lines: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeStatus> {
        self.nodes.iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a NodeStatus;
    type IntoIter = std::slice::Iter<'a, NodeStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
