//! Snapshot reports
//!
//! Renders one evaluated snapshot either as colored text or as JSON.

use chrono::{DateTime, Utc};
use colored::*;
use fleetwait_core::classifier::is_capacity_error;
use fleetwait_core::{Decision, FleetPolicy, NodeStatus, downtime};
use fleetwait_runner::PollOutcome;
use serde::Serialize;
use std::time::Duration;

/// How a node was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeClass {
    Up,
    CapacityError,
    Down,
}

impl NodeClass {
    fn of(node: &NodeStatus, policy: &FleetPolicy) -> Self {
        if policy.is_up_state(&node.state) {
            NodeClass::Up
        } else if is_capacity_error(node, policy) {
            NodeClass::CapacityError
        } else {
            NodeClass::Down
        }
    }
}

/// One node line of a report
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    #[serde(flatten)]
    pub node: NodeStatus,
    pub class: NodeClass,
    pub down_for_secs: Option<u64>,
}

/// Full report for one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub observed_at: DateTime<Utc>,
    pub timeout_secs: u64,
    pub skipped_lines: usize,
    pub nodes: Vec<NodeReport>,
    pub decision: Decision,
}

impl Report {
    /// Builds a report from a poll outcome
    pub fn new(outcome: &PollOutcome, policy: &FleetPolicy, timeout: Duration) -> Self {
        let nodes = outcome
            .snapshot
            .iter()
            .map(|node| NodeReport {
                node: node.clone(),
                class: NodeClass::of(node, policy),
                down_for_secs: downtime(node, outcome.observed_at).map(|d| d.as_secs()),
            })
            .collect();

        Self {
            observed_at: outcome.observed_at,
            timeout_secs: timeout.as_secs(),
            skipped_lines: outcome.snapshot.skipped_lines,
            nodes,
            decision: outcome.decision.clone(),
        }
    }

    /// Prints the report as pretty JSON
    pub fn print_json(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }

    /// Prints the report for a terminal
    pub fn print(&self) {
        if self.nodes.is_empty() {
            println!("{}", "No static nodes found.".yellow());
        } else {
            println!(
                "{}",
                format!("Found {} static node(s):", self.nodes.len()).bold()
            );
            println!();
            for node in &self.nodes {
                print_node(node);
            }
        }

        if self.skipped_lines > 0 {
            println!();
            println!(
                "{}",
                format!("Skipped {} malformed line(s).", self.skipped_lines).yellow()
            );
        }

        println!();
        println!(
            "Decision at {} (timeout {}s): {}",
            self.observed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.timeout_secs,
            colorize_decision(&self.decision)
        );
    }
}

fn print_node(report: &NodeReport) {
    let node = &report.node;
    let class = match report.class {
        NodeClass::Up => "up".green(),
        NodeClass::CapacityError => "capacity error".yellow(),
        NodeClass::Down => "down".red(),
    };

    println!("  {} {} [{}] {}", "▸".cyan(), node.name.bold(), node.state, class);
    if let Some(secs) = report.down_for_secs {
        println!("    Down for:     {}s", secs);
    }
    if let Some(reason) = &node.reason {
        println!("    Reason:       {}", reason);
    }
}

fn colorize_decision(decision: &Decision) -> ColoredString {
    match decision {
        Decision::Ready => "ready".green().bold(),
        Decision::KeepWaiting => "keep waiting".yellow().bold(),
        Decision::FatalTimeout { node, elapsed } => {
            format!("timed out ({} down for {}s)", node, elapsed.as_secs())
                .red()
                .bold()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fleetwait_core::{Snapshot, classify, evaluate};

    fn outcome(nodes: Vec<NodeStatus>, now: DateTime<Utc>) -> PollOutcome {
        let policy = FleetPolicy::default();
        let snapshot = Snapshot::new(nodes);
        let classification = classify(&snapshot, &policy);
        let decision = evaluate(&classification, now, Duration::from_secs(3600));
        PollOutcome {
            observed_at: now,
            snapshot,
            classification,
            decision,
        }
    }

    #[test]
    fn test_report_classes() {
        let now = Utc.with_ymd_and_hms(2023, 1, 13, 19, 5, 0).unwrap();
        let since = Utc.with_ymd_and_hms(2023, 1, 13, 19, 0, 0).unwrap();
        let outcome = outcome(
            vec![
                NodeStatus::up("q-st-a-1", "idle"),
                NodeStatus::down(
                    "q-st-a-2",
                    "down",
                    since,
                    Some("(Code:InsufficientInstanceCapacity) partition".to_string()),
                ),
                NodeStatus::down("q-st-a-3", "down*", since, None),
            ],
            now,
        );

        let report = Report::new(&outcome, &FleetPolicy::default(), Duration::from_secs(3600));
        let classes: Vec<NodeClass> = report.nodes.iter().map(|n| n.class).collect();
        assert_eq!(
            classes,
            vec![NodeClass::Up, NodeClass::CapacityError, NodeClass::Down]
        );
        assert_eq!(report.nodes[0].down_for_secs, None);
        assert_eq!(report.nodes[2].down_for_secs, Some(300));
        assert_eq!(report.decision, Decision::KeepWaiting);
    }

    #[test]
    fn test_report_json() {
        let now = Utc.with_ymd_and_hms(2023, 1, 13, 19, 5, 0).unwrap();
        let outcome = outcome(vec![NodeStatus::up("q-st-a-1", "mix")], now);
        let report = Report::new(&outcome, &FleetPolicy::default(), Duration::from_secs(3600));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["nodes"][0]["name"], "q-st-a-1");
        assert_eq!(json["nodes"][0]["class"], "up");
        assert_eq!(json["decision"], "Ready");
        assert_eq!(json["timeout_secs"], 3600);
    }
}
