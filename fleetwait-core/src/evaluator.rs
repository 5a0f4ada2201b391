//! Readiness evaluation
//!
//! Decides, from one classified snapshot, whether the fleet is ready, still
//! coming up, or stuck. Capacity errors never count against the timeout:
//! the scheduler keeps retrying those allocations on its own.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::decision::{Classification, Decision};
use crate::domain::node::NodeStatus;

/// How long a node has been down at `now`
///
/// Returns `None` for nodes without a down-since timestamp. A timestamp in
/// the future counts as zero downtime.
pub fn downtime(node: &NodeStatus, now: DateTime<Utc>) -> Option<Duration> {
    let since = node.down_since?;
    Some((now - since).to_std().unwrap_or(Duration::ZERO))
}

/// Evaluates a classified snapshot
///
/// A node times out only when its downtime is strictly greater than
/// `timeout`. When several nodes are past the timeout, the first one in
/// snapshot order is reported.
pub fn evaluate(classification: &Classification, now: DateTime<Utc>, timeout: Duration) -> Decision {
    if classification.all_up() {
        return Decision::Ready;
    }

    classification
        .other_down
        .iter()
        .find_map(|node| {
            downtime(node, now)
                .filter(|elapsed| *elapsed > timeout)
                .map(|elapsed| Decision::FatalTimeout {
                    node: node.name.clone(),
                    elapsed,
                })
        })
        .unwrap_or(Decision::KeepWaiting)
}
