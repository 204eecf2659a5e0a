//! Versioned context-store documents and references to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Reserved domain for orchestration audit records (delegation transitions,
/// run lifecycle). Written by the engine itself, never by roles.
pub const PROGRESS_DOMAIN: &str = "progress";

/// Reserved domain for persisted gate evaluations.
pub const GATES_DOMAIN: &str = "gates";

/// Domain under which the controller persists returned deliverables.
pub const DELIVERABLES_DOMAIN: &str = "deliverables";

/// A single immutable version of a document in the context store.
///
/// Entries are append-only: writing to an existing key creates a new version
/// whose `supersedes` points at the previous version's id. Nothing is ever
/// mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Unique id of this version.
    pub id: Uuid,
    /// Logical path, e.g. `decisionLog/auth-oauth`.
    pub key: String,
    /// Domain/category the entry belongs to.
    pub domain: String,
    /// Opaque document content.
    pub content: Value,
    /// Role (or engine component) that authored this version.
    pub author: String,
    /// Monotonic version number per key, starting at 1.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    /// Id of the version this one supersedes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<Uuid>,
}

impl ContextEntry {
    /// Whether the content carries nothing usable as evidence.
    pub fn is_empty_content(&self) -> bool {
        match &self.content {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }
}

/// A not-yet-versioned document destined for the context store.
///
/// Roles return these inside a [`crate::DelegationResult`]; the store assigns
/// id, version, and timestamp at append time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub key: String,
    pub domain: String,
    pub content: Value,
}

impl EntryDraft {
    pub fn new(key: impl Into<String>, domain: impl Into<String>, content: Value) -> Self {
        Self {
            key: key.into(),
            domain: domain.into(),
            content,
        }
    }
}

/// A reference into the context store: a key, optionally pinned to a version.
///
/// Unpinned references resolve to the latest version at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRef {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl ContextRef {
    /// Reference the latest version of `key`.
    pub fn latest(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: None,
        }
    }

    /// Reference a specific version of `key`.
    pub fn pinned(key: impl Into<String>, version: u64) -> Self {
        Self {
            key: key.into(),
            version: Some(version),
        }
    }
}
