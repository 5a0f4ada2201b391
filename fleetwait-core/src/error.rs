//! Error types for status parsing

use thiserror::Error;

/// Result type alias for parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// A scheduler status line that could not be turned into a node record
///
/// Every variant carries the 1-based line number within the raw output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Line has no state field
    #[error("line {line}: expected at least name and state, got {fields} field(s)")]
    TooFewFields { line: usize, fields: usize },

    /// Down node without a down-since timestamp
    #[error("line {line}: node {node} is down but has no down-since timestamp")]
    MissingTimestamp { line: usize, node: String },

    /// Timestamp could not be parsed
    #[error("line {line}: invalid down-since timestamp '{value}' for node {node}")]
    InvalidTimestamp {
        line: usize,
        node: String,
        value: String,
    },

    /// Timestamp has no offset and no offset is configured for naive timestamps
    #[error("line {line}: timestamp '{value}' for node {node} has no timezone offset")]
    NaiveTimestamp {
        line: usize,
        node: String,
        value: String,
    },

    /// Node appears more than once in the same snapshot
    #[error("line {line}: duplicate node {node}")]
    DuplicateNode { line: usize, node: String },
}

impl ParseError {
    /// Line number the error refers to
    pub fn line(&self) -> usize {
        match self {
            Self::TooFewFields { line, .. }
            | Self::MissingTimestamp { line, .. }
            | Self::InvalidTimestamp { line, .. }
            | Self::NaiveTimestamp { line, .. }
            | Self::DuplicateNode { line, .. } => *line,
        }
    }
}

/// A fleet policy that cannot be used
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Node name pattern is not a valid regex
    #[error("invalid node name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
