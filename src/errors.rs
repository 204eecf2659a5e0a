//! Typed error hierarchy for the Cadence engine.
//!
//! Four top-level enums cover the four subsystems:
//! - `StoreError` — context store failures (conflict, not-found, infrastructure)
//! - `DispatchError` — delegation routing and execution failures
//! - `PhaseError` — illegal phase state machine transitions
//! - `EngineError` — controller and administrative surface failures

use thiserror::Error;
use uuid::Uuid;

/// Errors from the context store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no entry found for key {key}")]
    NotFound { key: String },

    #[error("key {key} has no version {version}")]
    VersionNotFound { key: String, version: u64 },

    /// A concurrent writer landed first. Retried with a freshly read base
    /// version by the store's `put` wrapper; only `put_at` surfaces it.
    #[error("version conflict on {key}: wrote against base {base}, latest is {latest}")]
    VersionConflict { key: String, base: u64, latest: u64 },

    #[error("context store unavailable: {0}")]
    Unavailable(#[source] std::io::Error),
}

impl StoreError {
    /// Check if this is an optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Check if this is an infrastructure fault worth retrying with backoff.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors from the delegation dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no role registered under name {role}")]
    UnknownRole { role: String },

    #[error("delegation {task_id} failed after {attempts} attempts: {reason}")]
    DelegationFailed {
        task_id: Uuid,
        attempts: u32,
        reason: String,
    },

    #[error("delegation {task_id} was cancelled")]
    Cancelled { task_id: Uuid },

    #[error("delegation {task_id} did not acknowledge cancellation within the grace period")]
    CancellationTimeout { task_id: Uuid },

    #[error("result channel for delegation {task_id} closed unexpectedly")]
    ChannelClosed { task_id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// Check if the delegation ended because of cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::CancellationTimeout { .. })
    }
}

/// Errors from the phase state machine.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("phase {phase}: invalid transition from {from} to {to}")]
    InvalidTransition {
        phase: String,
        from: String,
        to: String,
    },

    #[error("phase {phase} has already advanced")]
    AlreadyAdvanced { phase: String },

    #[error("phase {phase}: cannot begin delegating with an empty task set")]
    EmptyTaskSet { phase: String },
}

/// Errors from the controller and the administrative surface.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("run {id} not found")]
    RunNotFound { id: Uuid },

    #[error("invalid blueprint: {0}")]
    BlueprintInvalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
