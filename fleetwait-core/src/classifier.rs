//! Failure classification
//!
//! Splits the down nodes of a snapshot into capacity errors, which are
//! expected to resolve on their own, and every other failure.

use tracing::info;

use crate::domain::decision::Classification;
use crate::domain::node::{NodeStatus, Snapshot};
use crate::policy::FleetPolicy;

/// Extracts `<CODE>` from a reason starting with `(Code:<CODE>)`
pub fn reason_code(reason: &str) -> Option<&str> {
    let rest = reason.strip_prefix("(Code:")?;
    let (code, _) = rest.split_once(')')?;
    Some(code)
}

/// Returns true if the node is down because of a capacity error
pub fn is_capacity_error(node: &NodeStatus, policy: &FleetPolicy) -> bool {
    node.reason
        .as_deref()
        .and_then(reason_code)
        .is_some_and(|code| policy.is_capacity_error_code(code))
}

/// Classifies every node of a snapshot
///
/// Up nodes are only counted. Down nodes keep their snapshot order in the
/// bucket they are assigned to. Skipped lines carry over as unreadable.
pub fn classify(snapshot: &Snapshot, policy: &FleetPolicy) -> Classification {
    let mut classification = Classification {
        unreadable_lines: snapshot.skipped_lines,
        ..Classification::default()
    };

    for node in snapshot {
        if policy.is_up_state(&node.state) {
            classification.up_count += 1;
        } else if is_capacity_error(node, policy) {
            info!(
                "Node {} is down with capacity error: {}",
                node.name,
                node.reason.as_deref().unwrap_or_default()
            );
            classification.capacity_errors.push(node.clone());
        } else {
            classification.other_down.push(node.clone());
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StatusParser;
    use chrono::{TimeZone, Utc};

    fn down(name: &str, reason: Option<&str>) -> NodeStatus {
        NodeStatus::down(
            name,
            "down",
            Utc.with_ymd_and_hms(2023, 1, 13, 19, 0, 0).unwrap(),
            reason.map(str::to_string),
        )
    }

    #[test]
    fn test_reason_code() {
        assert_eq!(
            reason_code("(Code:InsufficientInstanceCapacity) partition"),
            Some("InsufficientInstanceCapacity")
        );
        assert_eq!(
            reason_code("(Code:SpotMaxPriceTooLow)Failure when resuming nodes"),
            Some("SpotMaxPriceTooLow")
        );
        assert_eq!(reason_code("inactive partition"), None);
        assert_eq!(reason_code("see (Code:Unsupported)"), None);
        assert_eq!(reason_code("(Code:Unterminated"), None);
    }

    #[test]
    fn test_classify_buckets() {
        let policy = FleetPolicy::default();
        let snapshot = Snapshot::new(vec![
            NodeStatus::up("q-st-a-1", "idle"),
            down("q-st-a-2", Some("(Code:InsufficientInstanceCapacity) partition")),
            down("q-st-a-3", Some("(Code:InvalidBlockDeviceMapping)Failure")),
            down("q-st-a-4", None),
            down("q-st-a-5", Some("(Code:MaxSpotInstanceCountExceeded)x")),
            NodeStatus::up("q-st-a-6", "alloc"),
        ]);

        let classification = classify(&snapshot, &policy);
        assert_eq!(classification.up_count, 2);
        assert_eq!(classification.capacity_error_names(), vec!["q-st-a-2", "q-st-a-5"]);
        assert_eq!(classification.other_down_names(), vec!["q-st-a-3", "q-st-a-4"]);
        assert_eq!(classification.total(), snapshot.len());
    }

    #[test]
    fn test_classify_respects_configured_codes() {
        let policy = FleetPolicy {
            capacity_error_codes: vec!["InvalidBlockDeviceMapping".to_string()],
            ..FleetPolicy::default()
        };
        let snapshot = Snapshot::new(vec![
            down("q-st-a-1", Some("(Code:InsufficientInstanceCapacity)x")),
            down("q-st-a-2", Some("(Code:InvalidBlockDeviceMapping)x")),
        ]);

        let classification = classify(&snapshot, &policy);
        assert_eq!(classification.capacity_error_names(), vec!["q-st-a-2"]);
        assert_eq!(classification.other_down_names(), vec!["q-st-a-1"]);
    }

    #[test]
    fn test_classify_carries_skipped_lines() {
        let parser = StatusParser::new(FleetPolicy::default()).unwrap();
        let snapshot = parser
            .parse("q-st-a-1 idle# Unknown none\nq-st-a-2 idle Unknown none")
            .unwrap();

        let classification = classify(&snapshot, parser.policy());
        assert_eq!(classification.up_count, 1);
        assert_eq!(classification.unreadable_lines, 1);
        assert!(!classification.all_up());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let raw = "\
q-st-a-1 idle Unknown none
q-st-a-2 down~ 2023-01-13T19:00:00 (Code:InsufficientHostCapacity)Failure
q-st-a-3 down* 2023-01-13T18:00:00 Not responding
q-dy-a-1 idle~ - -";
        let parser = StatusParser::new(FleetPolicy::default()).unwrap();

        let first = classify(&parser.parse(raw).unwrap(), parser.policy());
        let second = classify(&parser.parse(raw).unwrap(), parser.policy());
        assert_eq!(first, second);
        assert_eq!(first.capacity_error_names(), vec!["q-st-a-2"]);
        assert_eq!(first.other_down_names(), vec!["q-st-a-3"]);
    }
}
