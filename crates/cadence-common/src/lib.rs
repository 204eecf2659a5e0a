//! Shared domain types for the Cadence orchestration engine.
//!
//! Everything here is plain serializable data: context entries, task specs,
//! delegation results, gate contracts, and the phase/run status enums. The
//! engine crate owns all behavior; this crate owns the shapes that cross
//! component boundaries and land in the journal.

pub mod entry;
pub mod gate;
pub mod run;
pub mod task;

pub use entry::{ContextEntry, ContextRef, EntryDraft, DELIVERABLES_DOMAIN, GATES_DOMAIN, PROGRESS_DOMAIN};
pub use gate::{
    Criterion, CriterionOutcome, CriterionVerdict, EvaluatorSpec, Gate, GateEvaluation, GateStatus,
};
pub use run::{PhaseKind, PhaseStep, ProjectRun, RunStatus};
pub use task::{DelegationResult, DelegationStatus, FollowUpTask, TaskSpec};
