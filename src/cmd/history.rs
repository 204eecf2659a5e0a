use anyhow::{bail, Result};
use console::style;
use std::path::Path;

use crate::cmd::open_snapshot;

/// Longest content preview printed per version.
const PREVIEW_LEN: usize = 72;

pub fn run(journal: &Path, key: &str) -> Result<()> {
    let store = open_snapshot(journal)?;
    let history = store.history(key);

    if history.is_empty() {
        bail!("no entries found for key {key}");
    }

    println!("{} {}", style("History of").bold(), style(key).cyan());
    for entry in history {
        let content = entry.content.to_string();
        let preview: String = if content.chars().count() > PREVIEW_LEN {
            let truncated: String = content.chars().take(PREVIEW_LEN).collect();
            format!("{truncated}…")
        } else {
            content
        };
        println!(
            "  v{:<3} {} {} {}",
            entry.version,
            style(entry.created_at.format("%Y-%m-%d %H:%M:%S")).dim(),
            style(&entry.author).magenta(),
            preview,
        );
    }

    Ok(())
}
