use anyhow::{Context, Result};
use cadence::blueprint::Blueprint;
use console::style;
use std::path::Path;

pub fn run(path: &Path) -> Result<()> {
    let blueprint = Blueprint::load(path)?;
    blueprint
        .validate()
        .with_context(|| format!("blueprint {} is invalid", path.display()))?;

    let tasks: usize = blueprint.phases.iter().map(|p| p.tasks.len()).sum();
    let gates: usize = blueprint.phases.iter().map(|p| p.gates.len()).sum();
    println!(
        "{} {} ({} phases, {} tasks, {} gates, roles: {})",
        style("OK").green().bold(),
        path.display(),
        blueprint.phases.len(),
        tasks,
        gates,
        blueprint.referenced_roles().join(", "),
    );

    Ok(())
}
