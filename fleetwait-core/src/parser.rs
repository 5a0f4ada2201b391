//! Scheduler status parser
//!
//! Turns raw node listing output into [`NodeStatus`] records.
//!
//! Each line carries up to four whitespace separated fields:
//!
//! ```text
//! <name> <state> <down-since> <reason text, may contain spaces>
//! compute-st-c5-1 down~ 2023-01-13T19:35:43 (Code:InsufficientInstanceCapacity)Failure
//! ```
//!
//! Only static node names are kept. Lines that cannot be interpreted are
//! handled according to the policy's [`MalformedLinePolicy`].

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::domain::node::{NodeStatus, Snapshot};
use crate::error::{ParseError, PolicyError, Result};
use crate::policy::{FleetPolicy, MalformedLinePolicy};

/// Format of timestamps printed without an offset
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Offset-aware format for `+hhmm` style suffixes
const OFFSET_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Placeholder the scheduler prints for an empty field
const EMPTY_FIELD: &str = "-";

/// Parser for node status listings
#[derive(Debug, Clone)]
pub struct StatusParser {
    policy: FleetPolicy,
    node_name: Regex,
}

impl StatusParser {
    /// Creates a parser for the given policy
    ///
    /// # Errors
    /// Returns an error if the policy's node pattern is not a valid regex
    pub fn new(policy: FleetPolicy) -> std::result::Result<Self, PolicyError> {
        let node_name = Regex::new(&format!("^(?:{})$", policy.node_pattern))?;
        Ok(Self { policy, node_name })
    }

    pub fn policy(&self) -> &FleetPolicy {
        &self.policy
    }

    /// Returns true if the name belongs to a static node
    pub fn is_static_node(&self, name: &str) -> bool {
        self.node_name.is_match(name)
    }

    /// Parses raw status output into a snapshot
    ///
    /// # Errors
    /// With [`MalformedLinePolicy::Fail`], returns the first malformed line.
    /// With [`MalformedLinePolicy::Skip`] this never fails; dropped lines are
    /// counted in [`Snapshot::skipped_lines`] and block a ready decision.
    pub fn parse(&self, raw: &str) -> Result<Snapshot> {
        let mut snapshot = Snapshot::default();
        let mut seen = HashSet::new();

        for (idx, line) in raw.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.parse_line(line_no, line, &seen) {
                Ok(Some(node)) => {
                    seen.insert(node.name.clone());
                    snapshot.nodes.push(node);
                }
                Ok(None) => {}
                Err(e) => match self.policy.malformed_lines {
                    MalformedLinePolicy::Fail => return Err(e),
                    MalformedLinePolicy::Skip => {
                        warn!("Skipping malformed status line: {}", e);
                        snapshot.skipped_lines += 1;
                    }
                },
            }
        }

        Ok(snapshot)
    }

    /// Parses a single non-empty line
    ///
    /// Returns `Ok(None)` for lines describing non-static nodes.
    fn parse_line(
        &self,
        line_no: usize,
        line: &str,
        seen: &HashSet<String>,
    ) -> Result<Option<NodeStatus>> {
        let fields = split_fields(line, 4);

        let name = fields[0];
        if !self.is_static_node(name) {
            debug!("Ignoring non-static node {}", name);
            return Ok(None);
        }

        if fields.len() < 2 {
            return Err(ParseError::TooFewFields {
                line: line_no,
                fields: fields.len(),
            });
        }

        if seen.contains(name) {
            return Err(ParseError::DuplicateNode {
                line: line_no,
                node: name.to_string(),
            });
        }

        let state = fields[1];
        if self.policy.is_up_state(state) {
            return Ok(Some(NodeStatus::up(name, state)));
        }

        let raw_since = fields
            .get(2)
            .copied()
            .filter(|value| *value != EMPTY_FIELD)
            .ok_or_else(|| ParseError::MissingTimestamp {
                line: line_no,
                node: name.to_string(),
            })?;
        let down_since = self.parse_timestamp(line_no, name, raw_since)?;
        let reason = fields.get(3).map(|reason| reason.to_string());

        Ok(Some(NodeStatus::down(name, state, down_since, reason)))
    }

    /// Parses a down-since timestamp
    ///
    /// Offset-aware timestamps are taken as is. Naive ones are placed in the
    /// policy's naive offset, or rejected when none is configured.
    fn parse_timestamp(&self, line_no: usize, node: &str, value: &str) -> Result<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
            return Ok(ts.with_timezone(&Utc));
        }
        if let Ok(ts) = DateTime::parse_from_str(value, OFFSET_TIMESTAMP_FORMAT) {
            return Ok(ts.with_timezone(&Utc));
        }

        let naive = NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT).map_err(|_| {
            ParseError::InvalidTimestamp {
                line: line_no,
                node: node.to_string(),
                value: value.to_string(),
            }
        })?;

        self.policy
            .naive_offset
            .and_then(|offset| naive.and_local_timezone(offset).single())
            .map(|ts| ts.with_timezone(&Utc))
            .ok_or_else(|| ParseError::NaiveTimestamp {
                line: line_no,
                node: node.to_string(),
                value: value.to_string(),
            })
    }
}

/// Splits a line into at most `limit` whitespace separated fields
///
/// Runs of whitespace count as one separator. The last field keeps the rest
/// of the line, inner spacing included.
fn split_fields(line: &str, limit: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(limit);
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        if fields.len() + 1 == limit {
            fields.push(rest.trim_end());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }

    fields
}
