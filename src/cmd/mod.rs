//! CLI command handlers: read-only inspection over a journal plus
//! blueprint validation.

pub mod check;
pub mod gates;
pub mod history;
pub mod status;

use anyhow::{bail, Result};
use cadence::store::ContextStore;
use std::path::Path;

/// Open a read-only snapshot of the journal, with a friendly error when it
/// does not exist yet.
pub fn open_snapshot(journal: &Path) -> Result<ContextStore> {
    if !journal.exists() {
        bail!(
            "journal {} does not exist; point --journal at an engine's journal file",
            journal.display()
        );
    }
    ContextStore::replay(journal)
        .map_err(|e| anyhow::anyhow!("failed to read journal {}: {}", journal.display(), e))
}
