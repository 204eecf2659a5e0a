//! Append-only JSONL journal backing the context store.
//!
//! One serialized `ContextEntry` per line. The journal is the single durable
//! artifact of the engine: replaying it reconstructs every key's full
//! version history, the delegation audit trail, and gate evaluations.

use cadence_common::ContextEntry;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::errors::StoreError;

/// Open handle on a journal file, holding an exclusive advisory lock so two
/// engine processes cannot interleave appends.
pub struct Journal {
    file: File,
    path: PathBuf,
}

impl Journal {
    /// Open (or create) a journal for writing and replay its existing
    /// entries.
    ///
    /// Fails with `StoreError::Unavailable` if the file cannot be created,
    /// locked, or read, or if an existing line is not a valid entry.
    pub fn open(path: &Path) -> Result<(Self, Vec<ContextEntry>), StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(StoreError::Unavailable)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(StoreError::Unavailable)?;

        file.try_lock_exclusive().map_err(StoreError::Unavailable)?;

        let entries = Self::replay(path)?;

        Ok((
            Self {
                file,
                path: path.to_path_buf(),
            },
            entries,
        ))
    }

    /// Read every entry from a journal file without taking the write lock.
    ///
    /// Used by read-only consumers (the inspection CLI) against a journal a
    /// live engine may still hold open.
    pub fn replay(path: &Path) -> Result<Vec<ContextEntry>, StoreError> {
        let file = File::open(path).map_err(StoreError::Unavailable)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(StoreError::Unavailable)?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ContextEntry = serde_json::from_str(&line).map_err(|e| {
                StoreError::Unavailable(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("corrupt journal line {}: {}", idx + 1, e),
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Append one entry and flush it to disk.
    pub fn append(&mut self, entry: &ContextEntry) -> Result<(), StoreError> {
        let line = serde_json::to_string(entry)
            .map_err(|e| StoreError::Unavailable(std::io::Error::other(e)))?;

        writeln!(self.file, "{line}").map_err(StoreError::Unavailable)?;
        self.file.flush().map_err(StoreError::Unavailable)?;
        self.file.sync_data().map_err(StoreError::Unavailable)?;

        Ok(())
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn entry(key: &str, version: u64) -> ContextEntry {
        ContextEntry {
            id: Uuid::new_v4(),
            key: key.to_string(),
            domain: "test".to_string(),
            content: json!({"v": version}),
            author: "tester".to_string(),
            version,
            created_at: Utc::now(),
            supersedes: None,
        }
    }

    #[test]
    fn test_open_append_replay_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        let first = entry("spec/doc", 1);
        let second = entry("spec/doc", 2);

        {
            let (mut journal, existing) = Journal::open(&path).unwrap();
            assert!(existing.is_empty());
            journal.append(&first).unwrap();
            journal.append(&second).unwrap();
        }

        let (_, replayed) = Journal::open(&path).unwrap();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0], first);
        assert_eq!(replayed[1], second);
    }

    #[test]
    fn test_replay_without_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        let (mut journal, _) = Journal::open(&path).unwrap();
        journal.append(&entry("a", 1)).unwrap();

        // Read-only replay works while the writer still holds the lock.
        let replayed = Journal::replay(&path).unwrap();
        assert_eq!(replayed.len(), 1);
    }

    #[test]
    fn test_corrupt_line_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        let err = Journal::replay(&path).unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_missing_parent_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/journal.jsonl");

        let (mut journal, _) = Journal::open(&path).unwrap();
        journal.append(&entry("a", 1)).unwrap();
        assert!(path.exists());
    }
}
