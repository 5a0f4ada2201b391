//! Classify command handler
//!
//! Evaluates node status output captured earlier, for example from a failed
//! cluster bring-up, without touching the scheduler.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use fleetwait_core::{FleetPolicy, StatusParser, classify, evaluate};
use fleetwait_runner::PollOutcome;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;

use crate::config::Config;
use crate::report::Report;

/// Arguments of the classify command
#[derive(Args)]
pub struct ClassifyArgs {
    /// File with `sinfo -N -h -o '%N %t %H %E'` output, stdin if omitted
    #[arg(long, short)]
    file: Option<PathBuf>,

    /// Evaluation time as RFC 3339 (e.g. 2023-01-13T19:05:00Z), now if omitted
    #[arg(long)]
    now: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// Handle the classify command
///
/// # Arguments
/// * `args` - Input and output options
/// * `config` - The CLI configuration
pub async fn handle_classify_command(args: ClassifyArgs, config: &Config) -> Result<()> {
    let runner_config = config.runner_config()?;

    let raw = match &args.file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read status from stdin")?;
            raw
        }
    };

    let now = match &args.now {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .with_context(|| format!("Invalid --now timestamp '{}'", value))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let timeout = runner_config.static_fleet_timeout;
    let outcome = evaluate_raw(&raw, &runner_config.policy, now, timeout)?;
    let report = Report::new(&outcome, &runner_config.policy, timeout);

    if args.json {
        report.print_json()?;
    } else {
        report.print();
    }

    Ok(())
}

/// Parses, classifies and evaluates raw status output
fn evaluate_raw(
    raw: &str,
    policy: &FleetPolicy,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Result<PollOutcome> {
    let parser = StatusParser::new(policy.clone())?;
    let snapshot = parser.parse(raw)?;
    let classification = classify(&snapshot, policy);
    let decision = evaluate(&classification, now, timeout);

    Ok(PollOutcome {
        observed_at: now,
        snapshot,
        classification,
        decision,
    })
}
