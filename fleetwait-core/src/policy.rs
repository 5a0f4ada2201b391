//! Fleet policy
//!
//! Fixed knobs that decide how scheduler output is read: which states count
//! as up, which failure codes are transient capacity errors, what a static
//! node name looks like and how bad lines are handled.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// States in which a node counts as up
pub const DEFAULT_UP_STATES: &[&str] = &["idle", "alloc", "mix"];

/// Failure codes meaning the provider could not allocate capacity
pub const DEFAULT_CAPACITY_ERROR_CODES: &[&str] = &[
    "InsufficientInstanceCapacity",
    "InsufficientHostCapacity",
    "InsufficientReservedInstanceCapacity",
    "MaxSpotInstanceCountExceeded",
    "Unsupported",
    "SpotMaxPriceTooLow",
];

/// Unanchored name pattern of a static node: `<queue>-st-<compute-resource>-<index>`
///
/// Dynamic nodes use `-dy-` instead of `-st-` and never match.
pub const STATIC_NODE_NAME: &str = r"[a-z0-9-]+-st-[a-z0-9-]+-[0-9]+";

/// What the parser does with a line it cannot interpret
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedLinePolicy {
    /// Drop the line and log a warning
    ///
    /// Dropped lines are counted and keep the fleet from being reported up.
    #[default]
    Skip,

    /// Abort the poll with a parse error
    Fail,
}

/// Rules used to parse and classify one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetPolicy {
    /// State codes that count as up (exact match)
    pub up_states: Vec<String>,

    /// Reason codes treated as transient capacity errors
    pub capacity_error_codes: Vec<String>,

    /// Handling of malformed status lines
    pub malformed_lines: MalformedLinePolicy,

    /// Offset applied to timestamps printed without one
    ///
    /// `None` rejects such timestamps as malformed.
    pub naive_offset: Option<FixedOffset>,

    /// Unanchored regex a node name must match in full to be considered
    pub node_pattern: String,
}

impl FleetPolicy {
    /// Returns true if the state code counts as up
    pub fn is_up_state(&self, state: &str) -> bool {
        self.up_states.iter().any(|s| s == state)
    }

    /// Returns true if the reason code is a transient capacity error
    pub fn is_capacity_error_code(&self, code: &str) -> bool {
        self.capacity_error_codes.iter().any(|c| c == code)
    }

    pub fn with_malformed_lines(mut self, policy: MalformedLinePolicy) -> Self {
        self.malformed_lines = policy;
        self
    }

    pub fn with_naive_offset(mut self, offset: Option<FixedOffset>) -> Self {
        self.naive_offset = offset;
        self
    }
}

impl Default for FleetPolicy {
    fn default() -> Self {
        Self {
            up_states: DEFAULT_UP_STATES.iter().map(|s| s.to_string()).collect(),
            capacity_error_codes: DEFAULT_CAPACITY_ERROR_CODES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            malformed_lines: MalformedLinePolicy::Skip,
            naive_offset: FixedOffset::east_opt(0),
            node_pattern: STATIC_NODE_NAME.to_string(),
        }
    }
}
