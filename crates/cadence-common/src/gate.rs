//! Gate contracts and evaluation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::ContextRef;
use crate::run::PhaseKind;

/// A named checklist contract guarding a phase boundary.
///
/// A gate passes only when every criterion passes; there is no partial pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Stable identifier, unique within a blueprint.
    pub id: String,
    /// Phase this gate guards.
    pub phase: PhaseKind,
    pub name: String,
    pub criteria: Vec<Criterion>,
}

impl Gate {
    pub fn new(id: impl Into<String>, phase: PhaseKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phase,
            name: name.into(),
            criteria: Vec::new(),
        }
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }
}

/// One checklist item: a predicate over declared evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub description: String,
    pub evaluator: EvaluatorSpec,
    /// Evidence the evaluator runs against. Unpinned references resolve to
    /// the latest version at evaluation time.
    #[serde(default)]
    pub evidence: Vec<ContextRef>,
    /// Role remediation tasks for this criterion are routed to. Falls back
    /// to the phase plan's default role when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_role: Option<String>,
}

impl Criterion {
    pub fn new(description: impl Into<String>, evaluator: EvaluatorSpec) -> Self {
        Self {
            description: description.into(),
            evaluator,
            evidence: Vec::new(),
            remediation_role: None,
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<ContextRef>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_remediation_role(mut self, role: impl Into<String>) -> Self {
        self.remediation_role = Some(role.into());
        self
    }
}

/// Which predicate a criterion applies to its evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluatorSpec {
    /// All declared evidence entries exist and carry non-empty content.
    Exists,
    /// At least one entry exists in the given domain.
    DomainNonEmpty { domain: String },
    /// A numeric field (JSON pointer into the first evidence entry) meets a
    /// minimum threshold.
    NumericAtLeast { pointer: String, min: f64 },
    /// Every evidence entry's serialized content matches the regex.
    ContentMatches { pattern: String },
    /// A custom evaluator registered by name.
    Named { name: String },
}

/// Evaluation state of a gate within one phase instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    #[default]
    Unevaluated,
    /// Terminal for the phase instance; re-evaluation never re-triggers a
    /// phase advance.
    Passed,
    Failed,
}

impl GateStatus {
    pub fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Per-criterion verdict inside a gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionVerdict {
    Pass,
    /// The criterion was checked and is unmet (including missing evidence).
    Fail,
    /// The evaluator itself malfunctioned: malformed content, bad pointer,
    /// invalid pattern, unknown named evaluator. Distinct from `Fail` so
    /// remediation messages can tell "nothing submitted" from "something
    /// submitted but invalid".
    EvaluatorError,
}

/// Outcome of one criterion within one evaluation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub description: String,
    pub verdict: CriterionVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Immutable record of one gate evaluation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateEvaluation {
    pub gate_id: String,
    pub run_id: Uuid,
    pub phase: PhaseKind,
    pub evaluated_at: DateTime<Utc>,
    pub passed: bool,
    pub criteria: Vec<CriterionOutcome>,
    /// Failure reasons for every non-passing criterion, in criterion order.
    pub unmet: Vec<String>,
}

impl GateEvaluation {
    /// Whether any criterion failed because its evaluator malfunctioned.
    pub fn has_evaluator_errors(&self) -> bool {
        self.criteria
            .iter()
            .any(|c| c.verdict == CriterionVerdict::EvaluatorError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_builder() {
        let gate = Gate::new("spec-complete", PhaseKind::Specification, "Spec completeness")
            .with_criterion(
                Criterion::new("spec document exists", EvaluatorSpec::Exists)
                    .with_evidence(vec![ContextRef::latest("spec/doc")])
                    .with_remediation_role("analyst"),
            );

        assert_eq!(gate.criteria.len(), 1);
        assert_eq!(gate.criteria[0].remediation_role.as_deref(), Some("analyst"));
    }

    #[test]
    fn test_evaluator_spec_serde_tags() {
        let spec = EvaluatorSpec::NumericAtLeast {
            pointer: "/coverage".to_string(),
            min: 0.8,
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"kind\":\"numeric_at_least\""));

        let back: EvaluatorSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_gate_status_default_is_unevaluated() {
        assert_eq!(GateStatus::default(), GateStatus::Unevaluated);
        assert!(!GateStatus::Unevaluated.is_passed());
        assert!(GateStatus::Passed.is_passed());
    }

    #[test]
    fn test_evaluation_detects_evaluator_errors() {
        let eval = GateEvaluation {
            gate_id: "g".to_string(),
            run_id: Uuid::new_v4(),
            phase: PhaseKind::Refinement,
            evaluated_at: Utc::now(),
            passed: false,
            criteria: vec![CriterionOutcome {
                description: "coverage threshold".to_string(),
                verdict: CriterionVerdict::EvaluatorError,
                detail: Some("field is not numeric".to_string()),
            }],
            unmet: vec!["coverage threshold: field is not numeric".to_string()],
        };
        assert!(eval.has_evaluator_errors());
    }
}
