//! Task specifications and the boomerang payload roles return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::entry::{ContextRef, EntryDraft};

/// A unit of work delegated to a named role.
///
/// Input context travels as references into the context store, not copies;
/// the dispatcher resolves them into a read-only snapshot at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: Uuid,
    /// Owning project run.
    pub run_id: Uuid,
    /// Name of the role this task is routed to.
    pub role: String,
    /// What the role is asked to produce.
    pub objective: String,
    /// Context entries the role receives as input.
    #[serde(default)]
    pub inputs: Vec<ContextRef>,
    /// Deliverable keys the role is expected to return.
    #[serde(default)]
    pub deliverables: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TaskSpec {
    pub fn new(run_id: Uuid, role: impl Into<String>, objective: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            role: role.into(),
            objective: objective.into(),
            inputs: Vec::new(),
            deliverables: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<ContextRef>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_deliverables(mut self, deliverables: Vec<String>) -> Self {
        self.deliverables = deliverables;
        self
    }
}

/// Lifecycle status of a delegation.
///
/// Retries keep the delegation `in_flight` with an incremented attempt
/// counter; the same task id is reused so downstream writes stay idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DelegationStatus {
    Pending,
    InFlight { attempt: u32 },
    Returned,
    Failed { reason: String },
    Cancelled { reason: String },
}

impl DelegationStatus {
    /// Check if the delegation has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Returned | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }

    /// Short label for logs and audit records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight { .. } => "in_flight",
            Self::Returned => "returned",
            Self::Failed { .. } => "failed",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// A follow-up task a role surfaced alongside its deliverables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpTask {
    pub role: String,
    pub objective: String,
}

/// The enriched return payload of a delegation.
///
/// Beyond the requested deliverables a result may carry new context entries
/// to persist, identified risks, and follow-up tasks. Immutable once
/// created; consumed exactly once by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationResult {
    pub task_id: Uuid,
    /// Business-level outcome. `false` is a deliberate negative result, not
    /// an execution error, and is never retried.
    pub success: bool,
    /// Deliverable documents keyed by the deliverable names from the spec.
    #[serde(default)]
    pub deliverables: BTreeMap<String, Value>,
    /// New context entries to persist.
    #[serde(default)]
    pub entries: Vec<EntryDraft>,
    /// Risks identified while executing the task.
    #[serde(default)]
    pub risks: Vec<String>,
    /// Follow-up work surfaced by the role.
    #[serde(default)]
    pub follow_ups: Vec<FollowUpTask>,
}

impl DelegationResult {
    /// Create a successful result with no payload yet.
    pub fn success(task_id: Uuid) -> Self {
        Self {
            task_id,
            success: true,
            deliverables: BTreeMap::new(),
            entries: Vec::new(),
            risks: Vec::new(),
            follow_ups: Vec::new(),
        }
    }

    /// Create a deliberate negative business result.
    pub fn failure(task_id: Uuid) -> Self {
        Self {
            success: false,
            ..Self::success(task_id)
        }
    }

    pub fn with_deliverable(mut self, key: impl Into<String>, content: Value) -> Self {
        self.deliverables.insert(key.into(), content);
        self
    }

    pub fn with_entry(mut self, entry: EntryDraft) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn with_risk(mut self, risk: impl Into<String>) -> Self {
        self.risks.push(risk.into());
        self
    }

    pub fn with_follow_up(mut self, role: impl Into<String>, objective: impl Into<String>) -> Self {
        self.follow_ups.push(FollowUpTask {
            role: role.into(),
            objective: objective.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_spec_builder() {
        let run_id = Uuid::new_v4();
        let spec = TaskSpec::new(run_id, "architect", "design the auth flow")
            .with_inputs(vec![ContextRef::latest("spec/doc")])
            .with_deliverables(vec!["architecture/design".to_string()]);

        assert_eq!(spec.run_id, run_id);
        assert_eq!(spec.role, "architect");
        assert_eq!(spec.inputs.len(), 1);
        assert_eq!(spec.deliverables, vec!["architecture/design"]);
    }

    #[test]
    fn test_delegation_status_terminality() {
        assert!(!DelegationStatus::Pending.is_terminal());
        assert!(!DelegationStatus::InFlight { attempt: 2 }.is_terminal());
        assert!(DelegationStatus::Returned.is_terminal());
        assert!(
            DelegationStatus::Failed {
                reason: "boom".to_string()
            }
            .is_terminal()
        );
        assert!(
            DelegationStatus::Cancelled {
                reason: "aborted".to_string()
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_delegation_status_serde_tags() {
        let status = DelegationStatus::InFlight { attempt: 3 };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"state\":\"in_flight\""));
        assert!(json.contains("\"attempt\":3"));
    }

    #[test]
    fn test_result_builder_accumulates() {
        let task_id = Uuid::new_v4();
        let result = DelegationResult::success(task_id)
            .with_deliverable("spec/doc", json!({"requirements": []}))
            .with_entry(EntryDraft::new("decisionLog/db", "decisionLog", json!("postgres")))
            .with_risk("schema migration untested")
            .with_follow_up("security-auditor", "review token storage");

        assert!(result.success);
        assert_eq!(result.deliverables.len(), 1);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.risks.len(), 1);
        assert_eq!(result.follow_ups[0].role, "security-auditor");
    }

    #[test]
    fn test_failure_result_is_not_success() {
        let result = DelegationResult::failure(Uuid::new_v4());
        assert!(!result.success);
        assert!(result.deliverables.is_empty());
    }
}
