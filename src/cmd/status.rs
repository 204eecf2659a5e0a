use anyhow::{bail, Result};
use cadence::common::RunStatus;
use cadence::controller::{DelegationView, RunView};
use cadence::store::ContextStore;
use console::style;
use std::path::Path;
use uuid::Uuid;

use crate::cmd::open_snapshot;

pub fn run(journal: &Path, run_id: Option<Uuid>) -> Result<()> {
    let store = open_snapshot(journal)?;

    match run_id {
        Some(id) => {
            let Some(view) = RunView::from_store(&store, id) else {
                bail!("run {id} not found in journal");
            };
            print_detail(&view, &store);
        }
        None => {
            let views = RunView::list(&store);
            if views.is_empty() {
                println!("No runs recorded.");
                return Ok(());
            }
            for view in views {
                println!(
                    "{}  {}  {}/{}  {}",
                    style(view.id).dim(),
                    status_label(&view.status),
                    view.phase,
                    view.step,
                    view.goal,
                );
            }
        }
    }

    Ok(())
}

fn print_detail(view: &RunView, store: &ContextStore) {
    println!("{}      {}", style("Run:").bold(), view.id);
    println!("{}     {}", style("Goal:").bold(), view.goal);
    println!("{}    {}/{}", style("Phase:").bold(), view.phase, view.step);
    println!("{}   {}", style("Status:").bold(), status_label(&view.status));
    match &view.status {
        RunStatus::Blocked { reason } => {
            println!("{}   {}", style("Reason:").bold(), reason);
        }
        RunStatus::Failed { error } => {
            println!("{}    {}", style("Error:").bold(), error);
        }
        _ => {}
    }
    println!("{}  {}", style("Started:").bold(), view.created_at.to_rfc3339());
    println!("{}  {}", style("Updated:").bold(), view.updated_at.to_rfc3339());

    let delegations = DelegationView::for_run(store, view.id);
    if !delegations.is_empty() {
        println!("{}", style("Delegations:").bold());
        for delegation in delegations {
            println!(
                "  {}  {:<12} {} (attempts: {})",
                style(delegation.task_id).dim(),
                delegation.role,
                delegation.status.label(),
                delegation.attempts,
            );
        }
    }
}

fn status_label(status: &RunStatus) -> console::StyledObject<&'static str> {
    match status {
        RunStatus::Active => style("active").cyan(),
        RunStatus::Blocked { .. } => style("blocked").yellow(),
        RunStatus::Completed => style("completed").green(),
        RunStatus::Failed { .. } => style("failed").red(),
    }
}
