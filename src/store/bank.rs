//! In-memory version index with optimistic per-key concurrency control.

use cadence_common::{ContextEntry, ContextRef, EntryDraft};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::store::journal::Journal;

struct StoreInner {
    /// Per-key version chains, oldest first. Index i holds version i + 1.
    keys: BTreeMap<String, Vec<ContextEntry>>,
    journal: Option<Journal>,
}

/// The append-only, versioned context store shared across a run.
///
/// Writes are serialized internally; the compare-and-set base version in
/// [`ContextStore::put_at`] provides the per-key optimistic discipline for
/// concurrent writers. Reads return clones and never block writers beyond
/// the index lock.
pub struct ContextStore {
    inner: Mutex<StoreInner>,
}

impl ContextStore {
    /// Create an empty store with no durability.
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                keys: BTreeMap::new(),
                journal: None,
            }),
        }
    }

    /// Open a journal-backed store, replaying any existing entries.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let (journal, entries) = Journal::open(path)?;
        let keys = Self::index(entries)?;
        Ok(Self {
            inner: Mutex::new(StoreInner {
                keys,
                journal: Some(journal),
            }),
        })
    }

    /// Build a read-only snapshot of a journal without taking its write
    /// lock. Later writes to the returned store stay in memory.
    pub fn replay(path: &Path) -> Result<Self, StoreError> {
        let entries = Journal::replay(path)?;
        let keys = Self::index(entries)?;
        Ok(Self {
            inner: Mutex::new(StoreInner { keys, journal: None }),
        })
    }

    fn index(entries: Vec<ContextEntry>) -> Result<BTreeMap<String, Vec<ContextEntry>>, StoreError> {
        let mut keys: BTreeMap<String, Vec<ContextEntry>> = BTreeMap::new();
        for entry in entries {
            let chain = keys.entry(entry.key.clone()).or_default();
            let expected = chain.len() as u64 + 1;
            if entry.version != expected {
                return Err(StoreError::Unavailable(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "journal out of order for key {}: found version {}, expected {}",
                        entry.key, entry.version, expected
                    ),
                )));
            }
            chain.push(entry);
        }
        Ok(keys)
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable(std::io::Error::other("store lock poisoned")))
    }

    /// Append a new version of `draft.key`, checked against the base version
    /// the writer last read (`0` for a key it expects to be absent).
    ///
    /// A stale base means a concurrent writer landed first; the caller
    /// observes `VersionConflict` and retries with a fresh read. That
    /// conflict is the design invariant, not a bug case.
    pub fn put_at(
        &self,
        draft: EntryDraft,
        author: &str,
        base: u64,
    ) -> Result<ContextEntry, StoreError> {
        let mut inner = self.lock()?;
        let latest = inner.keys.get(&draft.key).map_or(0, |c| c.len() as u64);
        if base != latest {
            return Err(StoreError::VersionConflict {
                key: draft.key,
                base,
                latest,
            });
        }
        Self::append_locked(&mut inner, draft, author)
    }

    /// Append a new version of `draft.key` against whatever the latest
    /// version currently is.
    ///
    /// This is the read-modify-write client wrapper: the fresh read and the
    /// append happen under one lock, so `VersionConflict` never escapes it.
    pub fn put(&self, draft: EntryDraft, author: &str) -> Result<ContextEntry, StoreError> {
        let mut inner = self.lock()?;
        Self::append_locked(&mut inner, draft, author)
    }

    fn append_locked(
        inner: &mut StoreInner,
        draft: EntryDraft,
        author: &str,
    ) -> Result<ContextEntry, StoreError> {
        let chain = inner.keys.entry(draft.key.clone()).or_default();
        let entry = ContextEntry {
            id: Uuid::new_v4(),
            key: draft.key,
            domain: draft.domain,
            content: draft.content,
            author: author.to_string(),
            version: chain.len() as u64 + 1,
            created_at: Utc::now(),
            supersedes: chain.last().map(|e| e.id),
        };

        // Durability first: a failed journal append must not leave the
        // in-memory index ahead of disk.
        let key = entry.key.clone();
        if let Some(journal) = inner.journal.as_mut() {
            journal.append(&entry)?;
        }

        inner
            .keys
            .get_mut(&key)
            .expect("chain created above")
            .push(entry.clone());
        Ok(entry)
    }

    /// Latest version of `key`.
    pub fn get(&self, key: &str) -> Result<ContextEntry, StoreError> {
        let inner = self.lock()?;
        inner
            .keys
            .get(key)
            .and_then(|c| c.last())
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    /// A specific version of `key`.
    pub fn get_version(&self, key: &str, version: u64) -> Result<ContextEntry, StoreError> {
        let inner = self.lock()?;
        let chain = inner.keys.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        chain
            .get((version.max(1) - 1) as usize)
            .filter(|e| e.version == version)
            .cloned()
            .ok_or(StoreError::VersionNotFound {
                key: key.to_string(),
                version,
            })
    }

    /// Full version history of `key`, oldest first. Empty if the key has
    /// never been written.
    pub fn history(&self, key: &str) -> Vec<ContextEntry> {
        self.lock()
            .map(|inner| inner.keys.get(key).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Current latest version number of `key` (`0` if absent). The base a
    /// read-modify-write caller feeds back into [`ContextStore::put_at`].
    pub fn latest_version(&self, key: &str) -> u64 {
        self.lock()
            .map(|inner| inner.keys.get(key).map_or(0, |c| c.len() as u64))
            .unwrap_or(0)
    }

    /// Latest versions of every key in `domain` matching the predicate, in
    /// key order.
    pub fn query<F>(&self, domain: &str, predicate: F) -> Vec<ContextEntry>
    where
        F: Fn(&ContextEntry) -> bool,
    {
        let Ok(inner) = self.lock() else {
            return Vec::new();
        };
        inner
            .keys
            .values()
            .filter_map(|chain| chain.last())
            .filter(|e| e.domain == domain && predicate(e))
            .cloned()
            .collect()
    }

    /// Keys starting with `prefix`, in key order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let Ok(inner) = self.lock() else {
            return Vec::new();
        };
        inner
            .keys
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Resolve references into a read-only snapshot: latest versions unless
    /// a reference pins one.
    pub fn resolve(&self, refs: &[ContextRef]) -> Result<Vec<ContextEntry>, StoreError> {
        refs.iter()
            .map(|r| match r.version {
                Some(version) => self.get_version(&r.key, version),
                None => self.get(&r.key),
            })
            .collect()
    }

    /// Convenience for JSON content lookups in gate evidence and views.
    pub fn latest_content(&self, key: &str) -> Option<Value> {
        self.get(key).ok().map(|e| e.content)
    }
}
