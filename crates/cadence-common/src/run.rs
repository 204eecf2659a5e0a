//! Project runs and the fixed phase sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The fixed, ordered phase sequence. No dynamic phase insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Specification,
    Pseudocode,
    Architecture,
    Refinement,
    Completion,
}

impl PhaseKind {
    /// All phases in execution order.
    pub const ALL: [PhaseKind; 5] = [
        PhaseKind::Specification,
        PhaseKind::Pseudocode,
        PhaseKind::Architecture,
        PhaseKind::Refinement,
        PhaseKind::Completion,
    ];

    /// The first phase of every run.
    pub fn first() -> Self {
        PhaseKind::Specification
    }

    /// Zero-based position in the sequence.
    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    /// The next phase, or `None` after `Completion`.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Specification => "specification",
            Self::Pseudocode => "pseudocode",
            Self::Architecture => "architecture",
            Self::Refinement => "refinement",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-status a phase moves through while the controller works it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStep {
    Planning,
    Delegating,
    GateChecking,
    Advancing,
    Remediating,
}

impl PhaseStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Delegating => "delegating",
            Self::GateChecking => "gate_checking",
            Self::Advancing => "advancing",
            Self::Remediating => "remediating",
        }
    }
}

impl fmt::Display for PhaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a project run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    /// Automatic progression halted; an external decision is required.
    Blocked { reason: String },
    Completed,
    Failed { error: String },
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked { .. } => "blocked",
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One execution of the methodology over a project goal.
///
/// Created at start, mutated only by the controller, terminated when the
/// final gate passes or the run is aborted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRun {
    pub id: Uuid,
    pub goal: String,
    pub phase: PhaseKind,
    pub step: PhaseStep,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
}

impl ProjectRun {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal: goal.into(),
            phase: PhaseKind::first(),
            step: PhaseStep::Planning,
            status: RunStatus::Active,
            created_at: Utc::now(),
        }
    }
}
