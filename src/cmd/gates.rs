use anyhow::{bail, Result};
use cadence::common::GateEvaluation;
use console::style;
use std::path::Path;
use uuid::Uuid;

use crate::cmd::open_snapshot;

pub fn run(journal: &Path, run_id: Uuid, gate: Option<&str>) -> Result<()> {
    let store = open_snapshot(journal)?;

    let mut evaluations: Vec<GateEvaluation> = store
        .keys_with_prefix(&format!("gates/{run_id}/"))
        .into_iter()
        .flat_map(|key| {
            store
                .history(&key)
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry.content).ok())
        })
        .filter(|e: &GateEvaluation| gate.is_none_or(|g| e.gate_id == g))
        .collect();
    evaluations.sort_by_key(|e| e.evaluated_at);

    if evaluations.is_empty() {
        bail!("no gate evaluations recorded for run {run_id}");
    }

    for evaluation in evaluations {
        let verdict = if evaluation.passed {
            style("passed").green()
        } else {
            style("failed").red()
        };
        println!(
            "{} {} [{}] {}",
            style(evaluation.evaluated_at.format("%Y-%m-%d %H:%M:%S")).dim(),
            style(&evaluation.gate_id).cyan(),
            evaluation.phase,
            verdict,
        );
        for unmet in &evaluation.unmet {
            println!("    {} {}", style("✗").red(), unmet);
        }
    }

    Ok(())
}
