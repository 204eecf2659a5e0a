//! Context store ("memory bank"): append-only, versioned key/document
//! storage shared across a run.
//!
//! Content blobs are never mutated in place; only the latest-version index
//! moves forward. Writers race through per-key optimistic versioning
//! (`put_at`), readers never observe partial state, and an optional JSONL
//! journal makes the whole store replayable after a restart.

mod bank;
mod journal;

pub use bank::ContextStore;
pub use journal::Journal;
