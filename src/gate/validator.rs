//! Gate evaluation against the context store.

use cadence_common::{
    ContextEntry, Criterion, CriterionOutcome, CriterionVerdict, EntryDraft, EvaluatorSpec, Gate,
    GateEvaluation, GATES_DOMAIN,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::gate::evaluators::{
    ContentMatchesEvaluator, CriterionEvaluator, DomainNonEmptyEvaluator, EvaluatorRegistry,
    ExistsEvaluator, NumericAtLeastEvaluator,
};
use crate::store::ContextStore;

/// Author recorded on persisted gate evaluations.
const VALIDATOR_AUTHOR: &str = "gate-validator";

/// Evaluates gate contracts and persists each attempt to the `gates`
/// domain.
#[derive(Clone, Default)]
pub struct GateValidator {
    registry: EvaluatorRegistry,
}

impl GateValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: EvaluatorRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate every criterion of `gate` against the store.
    ///
    /// Only store infrastructure faults propagate; missing evidence and
    /// evaluator malfunctions land in the returned evaluation.
    pub fn evaluate(
        &self,
        gate: &Gate,
        store: &ContextStore,
        run_id: Uuid,
    ) -> Result<GateEvaluation, StoreError> {
        let mut criteria = Vec::with_capacity(gate.criteria.len());
        let mut unmet = Vec::new();

        for criterion in &gate.criteria {
            let outcome = self.evaluate_criterion(criterion, store)?;
            if outcome.verdict != CriterionVerdict::Pass {
                if outcome.verdict == CriterionVerdict::EvaluatorError {
                    warn!(
                        gate = %gate.id,
                        criterion = %criterion.description,
                        detail = outcome.detail.as_deref().unwrap_or(""),
                        "criterion evaluator malfunctioned; check the gate definition"
                    );
                }
                unmet.push(match &outcome.detail {
                    Some(detail) => format!("{}: {}", outcome.description, detail),
                    None => outcome.description.clone(),
                });
            }
            criteria.push(outcome);
        }

        let passed = criteria.iter().all(|c| c.verdict == CriterionVerdict::Pass);
        Ok(GateEvaluation {
            gate_id: gate.id.clone(),
            run_id,
            phase: gate.phase,
            evaluated_at: Utc::now(),
            passed,
            criteria,
            unmet,
        })
    }

    /// Evaluate and persist the attempt as a new version of
    /// `gates/<run>/<gate>`. History is retained, never overwritten.
    pub fn evaluate_and_record(
        &self,
        gate: &Gate,
        store: &ContextStore,
        run_id: Uuid,
    ) -> Result<GateEvaluation, StoreError> {
        let evaluation = self.evaluate(gate, store, run_id)?;
        let content = serde_json::to_value(&evaluation)
            .map_err(|e| StoreError::Unavailable(std::io::Error::other(e)))?;
        store.put(
            EntryDraft::new(gate_key(run_id, &gate.id), GATES_DOMAIN, content),
            VALIDATOR_AUTHOR,
        )?;
        Ok(evaluation)
    }

    fn evaluate_criterion(
        &self,
        criterion: &Criterion,
        store: &ContextStore,
    ) -> Result<CriterionOutcome, StoreError> {
        // Resolve declared evidence first; missing evidence is always a
        // failure, never skipped.
        let mut evidence: Vec<ContextEntry> = Vec::with_capacity(criterion.evidence.len());
        let mut missing: Vec<String> = Vec::new();

        for evidence_ref in &criterion.evidence {
            let resolved = match evidence_ref.version {
                Some(version) => store.get_version(&evidence_ref.key, version),
                None => store.get(&evidence_ref.key),
            };
            match resolved {
                Ok(entry) => evidence.push(entry),
                Err(StoreError::NotFound { key }) => {
                    missing.push(format!("evidence missing: {key}"));
                }
                Err(StoreError::VersionNotFound { key, version }) => {
                    missing.push(format!("evidence missing: {key} (version {version})"));
                }
                Err(other) => return Err(other),
            }
        }

        if !missing.is_empty() {
            return Ok(CriterionOutcome {
                description: criterion.description.clone(),
                verdict: CriterionVerdict::Fail,
                detail: Some(missing.join("; ")),
            });
        }

        // Domain criteria draw their evidence from the store directly.
        if let EvaluatorSpec::DomainNonEmpty { domain } = &criterion.evaluator {
            evidence.extend(store.query(domain, |_| true));
        }

        let evaluator = match self.evaluator_for(&criterion.evaluator) {
            Ok(evaluator) => evaluator,
            Err(detail) => {
                return Ok(CriterionOutcome {
                    description: criterion.description.clone(),
                    verdict: CriterionVerdict::EvaluatorError,
                    detail: Some(detail),
                });
            }
        };

        let outcome = match evaluator.evaluate(&evidence) {
            Ok(true) => CriterionOutcome {
                description: criterion.description.clone(),
                verdict: CriterionVerdict::Pass,
                detail: None,
            },
            Ok(false) => CriterionOutcome {
                description: criterion.description.clone(),
                verdict: CriterionVerdict::Fail,
                detail: Some("criterion unmet".to_string()),
            },
            Err(fault) => CriterionOutcome {
                description: criterion.description.clone(),
                verdict: CriterionVerdict::EvaluatorError,
                detail: Some(fault.to_string()),
            },
        };
        Ok(outcome)
    }

    fn evaluator_for(&self, spec: &EvaluatorSpec) -> Result<Arc<dyn CriterionEvaluator>, String> {
        match spec {
            EvaluatorSpec::Exists => Ok(Arc::new(ExistsEvaluator)),
            EvaluatorSpec::DomainNonEmpty { .. } => Ok(Arc::new(DomainNonEmptyEvaluator)),
            EvaluatorSpec::NumericAtLeast { pointer, min } => {
                Ok(Arc::new(NumericAtLeastEvaluator::new(pointer, *min)))
            }
            EvaluatorSpec::ContentMatches { pattern } => {
                Ok(Arc::new(ContentMatchesEvaluator::new(pattern)))
            }
            EvaluatorSpec::Named { name } => self
                .registry
                .get(name)
                .ok_or_else(|| format!("no evaluator registered under name {name}")),
        }
    }
}

/// Store key under which evaluations of a gate are versioned.
pub fn gate_key(run_id: Uuid, gate_id: &str) -> String {
    format!("gates/{run_id}/{gate_id}")
}

/// Parse the persisted evaluation history of one gate, oldest first.
pub fn gate_history(store: &ContextStore, run_id: Uuid, gate_id: &str) -> Vec<GateEvaluation> {
    store
        .history(&gate_key(run_id, gate_id))
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry.content).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_common::{ContextRef, PhaseKind};
    use serde_json::json;

    fn store_with(entries: &[(&str, &str, serde_json::Value)]) -> ContextStore {
        let store = ContextStore::in_memory();
        for (key, domain, content) in entries {
            store
                .put(EntryDraft::new(*key, *domain, content.clone()), "tester")
                .unwrap();
        }
        store
    }

    fn gate_with(criteria: Vec<Criterion>) -> Gate {
        let mut gate = Gate::new("g", PhaseKind::Specification, "Test gate");
        gate.criteria = criteria;
        gate
    }

    #[test]
    fn test_all_criteria_pass_means_gate_passes() {
        let store = store_with(&[("spec/doc", "spec", json!("requirements"))]);
        let gate = gate_with(vec![
            Criterion::new("spec exists", EvaluatorSpec::Exists)
                .with_evidence(vec![ContextRef::latest("spec/doc")]),
        ]);

        let eval = GateValidator::new()
            .evaluate(&gate, &store, Uuid::new_v4())
            .unwrap();
        assert!(eval.passed);
        assert!(eval.unmet.is_empty());
    }

    #[test]
    fn test_single_failure_forces_overall_failure() {
        let store = store_with(&[("spec/doc", "spec", json!("requirements"))]);
        let gate = gate_with(vec![
            Criterion::new("spec exists", EvaluatorSpec::Exists)
                .with_evidence(vec![ContextRef::latest("spec/doc")]),
            Criterion::new("design exists", EvaluatorSpec::Exists)
                .with_evidence(vec![ContextRef::latest("architecture/design")]),
        ]);

        let eval = GateValidator::new()
            .evaluate(&gate, &store, Uuid::new_v4())
            .unwrap();
        assert!(!eval.passed);
        assert_eq!(eval.unmet.len(), 1);
        assert!(eval.unmet[0].contains("evidence missing: architecture/design"));
        assert_eq!(eval.criteria[0].verdict, CriterionVerdict::Pass);
        assert_eq!(eval.criteria[1].verdict, CriterionVerdict::Fail);
    }

    #[test]
    fn test_malformed_content_is_evaluator_error_not_fail() {
        let store = store_with(&[("report", "metrics", json!({"coverage": "not a number"}))]);
        let gate = gate_with(vec![
            Criterion::new(
                "coverage threshold",
                EvaluatorSpec::NumericAtLeast {
                    pointer: "/coverage".to_string(),
                    min: 0.8,
                },
            )
            .with_evidence(vec![ContextRef::latest("report")]),
        ]);

        let eval = GateValidator::new()
            .evaluate(&gate, &store, Uuid::new_v4())
            .unwrap();
        assert!(!eval.passed);
        assert_eq!(eval.criteria[0].verdict, CriterionVerdict::EvaluatorError);
        assert!(eval.has_evaluator_errors());
    }

    #[test]
    fn test_unknown_named_evaluator_is_evaluator_error() {
        let store = store_with(&[("x", "d", json!("y"))]);
        let gate = gate_with(vec![
            Criterion::new(
                "custom check",
                EvaluatorSpec::Named {
                    name: "missing-evaluator".to_string(),
                },
            )
            .with_evidence(vec![ContextRef::latest("x")]),
        ]);

        let eval = GateValidator::new()
            .evaluate(&gate, &store, Uuid::new_v4())
            .unwrap();
        assert_eq!(eval.criteria[0].verdict, CriterionVerdict::EvaluatorError);
        assert!(eval.unmet[0].contains("missing-evaluator"));
    }

    #[test]
    fn test_domain_criterion_queries_store() {
        let store = store_with(&[("decisionLog/db", "decisionLog", json!("postgres"))]);
        let gate = gate_with(vec![Criterion::new(
            "decisions recorded",
            EvaluatorSpec::DomainNonEmpty {
                domain: "decisionLog".to_string(),
            },
        )]);

        let eval = GateValidator::new()
            .evaluate(&gate, &store, Uuid::new_v4())
            .unwrap();
        assert!(eval.passed);

        let empty = ContextStore::in_memory();
        let eval = GateValidator::new()
            .evaluate(&gate, &empty, Uuid::new_v4())
            .unwrap();
        assert!(!eval.passed);
    }

    #[test]
    fn test_pinned_evidence_version() {
        let store = ContextStore::in_memory();
        store
            .put(EntryDraft::new("spec/doc", "spec", json!("draft")), "a")
            .unwrap();
        store
            .put(EntryDraft::new("spec/doc", "spec", json!("")), "a")
            .unwrap();

        // Latest (v2) is empty, but the criterion pins v1.
        let gate = gate_with(vec![
            Criterion::new("pinned spec exists", EvaluatorSpec::Exists)
                .with_evidence(vec![ContextRef::pinned("spec/doc", 1)]),
        ]);
        let eval = GateValidator::new()
            .evaluate(&gate, &store, Uuid::new_v4())
            .unwrap();
        assert!(eval.passed);
    }

    #[test]
    fn test_evaluations_are_recorded_as_history() {
        let store = store_with(&[("spec/doc", "spec", json!("ok"))]);
        let run_id = Uuid::new_v4();
        let gate = gate_with(vec![
            Criterion::new("spec exists", EvaluatorSpec::Exists)
                .with_evidence(vec![ContextRef::latest("spec/doc")]),
        ]);

        let validator = GateValidator::new();
        validator.evaluate_and_record(&gate, &store, run_id).unwrap();
        validator.evaluate_and_record(&gate, &store, run_id).unwrap();

        let history = gate_history(&store, run_id, "g");
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.passed));
        assert_eq!(store.history(&gate_key(run_id, "g")).len(), 2);
    }

    #[test]
    fn test_custom_registered_evaluator_is_used() {
        struct AlwaysFalse;
        impl CriterionEvaluator for AlwaysFalse {
            fn evaluate(&self, _evidence: &[ContextEntry]) -> anyhow::Result<bool> {
                Ok(false)
            }
        }

        let mut registry = EvaluatorRegistry::new();
        registry.register("always-false", Arc::new(AlwaysFalse));
        let validator = GateValidator::with_registry(registry);

        let store = store_with(&[("x", "d", json!("y"))]);
        let gate = gate_with(vec![
            Criterion::new(
                "custom",
                EvaluatorSpec::Named {
                    name: "always-false".to_string(),
                },
            )
            .with_evidence(vec![ContextRef::latest("x")]),
        ]);

        let eval = validator.evaluate(&gate, &store, Uuid::new_v4()).unwrap();
        assert!(!eval.passed);
        assert_eq!(eval.criteria[0].verdict, CriterionVerdict::Fail);
    }
}
