//! Drives one project run end to end: plan, delegate, persist, gate-check,
//! advance or remediate.

use cadence_common::{
    ContextEntry, Criterion, CriterionVerdict, DelegationResult, EntryDraft, Gate, GateEvaluation,
    GateStatus, PhaseKind, PhaseStep, ProjectRun, RunStatus, TaskSpec, DELIVERABLES_DOMAIN,
    PROGRESS_DOMAIN,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::blueprint::{Blueprint, PhasePlan, TaskTemplate};
use crate::config::EngineConfig;
use crate::dispatch::Dispatcher;
use crate::errors::{EngineError, StoreError};
use crate::gate::GateValidator;
use crate::phase::{PhaseMachine, RemediationOutcome};
use crate::store::ContextStore;

/// Author recorded on run lifecycle entries.
const CONTROLLER_AUTHOR: &str = "controller";

/// Store key carrying a run's lifecycle trace.
pub fn run_key(run_id: Uuid) -> String {
    format!("progress/run/{run_id}")
}

/// Snapshot persisted on every run transition. The latest version of
/// `progress/run/<id>` is the run's current state; the full history is its
/// audit trail. A restart reconstructs run status purely from these
/// records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTrace {
    pub goal: String,
    pub phase: PhaseKind,
    pub step: PhaseStep,
    pub status: RunStatus,
}

impl RunTrace {
    fn of(run: &ProjectRun) -> Self {
        Self {
            goal: run.goal.clone(),
            phase: run.phase,
            step: run.step,
            status: run.status.clone(),
        }
    }
}

/// Executes one run against a blueprint.
pub struct RunController {
    store: Arc<ContextStore>,
    dispatcher: Dispatcher,
    validator: GateValidator,
    config: EngineConfig,
}

impl RunController {
    pub fn new(
        store: Arc<ContextStore>,
        dispatcher: Dispatcher,
        validator: GateValidator,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            validator,
            config,
        }
    }

    /// Run the full phase sequence. Returns the terminal (or blocked)
    /// status.
    ///
    /// Gate failures never surface as errors; they drive the remediation
    /// loop. Store infrastructure faults are retried with backoff and,
    /// when exhausted, block the run instead of crashing it.
    pub async fn execute(
        &self,
        run: &mut ProjectRun,
        blueprint: &Blueprint,
    ) -> Result<RunStatus, EngineError> {
        match self.drive(run, blueprint).await {
            Ok(status) => Ok(status),
            Err(EngineError::Store(err)) if err.is_unavailable() => {
                warn!(run = %run.id, error = %err, "store retries exhausted; blocking run");
                run.status = RunStatus::Blocked {
                    reason: format!("context store unavailable: {err}"),
                };
                self.record_run_best_effort(run).await;
                Ok(run.status.clone())
            }
            Err(err) => Err(err),
        }
    }

    async fn drive(
        &self,
        run: &mut ProjectRun,
        blueprint: &Blueprint,
    ) -> Result<RunStatus, EngineError> {
        info!(run = %run.id, goal = %run.goal, "starting run");
        self.record_run(run).await?;

        let mut machine = PhaseMachine::new();

        loop {
            let phase = machine.current().kind;
            let plan = blueprint.plan_for(phase).ok_or_else(|| {
                EngineError::BlueprintInvalid(format!("no plan for phase {phase}"))
            })?;

            run.phase = phase;
            run.step = PhaseStep::Planning;
            self.record_run(run).await?;

            let mut tasks: Vec<TaskSpec> = plan
                .tasks
                .iter()
                .map(|t| task_from_template(run.id, t))
                .collect();
            let mut gate_states: HashMap<String, GateStatus> = plan
                .gates
                .iter()
                .map(|g| (g.id.clone(), GateStatus::Unevaluated))
                .collect();

            info!(run = %run.id, %phase, tasks = tasks.len(), gates = plan.gates.len(), "phase planned");

            // Delegation/gate cycle: loop until the gates pass or the
            // remediation bound escalates.
            loop {
                machine.current_mut().begin_delegating(tasks.len())?;
                run.step = PhaseStep::Delegating;
                self.record_run(run).await?;

                self.run_delegations(std::mem::take(&mut tasks)).await?;

                machine.current_mut().begin_gate_check()?;
                run.step = PhaseStep::GateChecking;
                self.record_run(run).await?;

                let mut failing: Vec<(String, Criterion)> = Vec::new();
                for gate in &plan.gates {
                    // A passed gate is terminal for this phase instance;
                    // re-evaluating it cannot re-trigger an advance.
                    if gate_states.get(&gate.id).copied().unwrap_or_default().is_passed() {
                        continue;
                    }
                    let evaluation = self.evaluate_gate(gate, run.id).await?;
                    if evaluation.passed {
                        info!(run = %run.id, gate = %gate.id, "gate passed");
                        gate_states.insert(gate.id.clone(), GateStatus::Passed);
                    } else {
                        info!(run = %run.id, gate = %gate.id, unmet = evaluation.unmet.len(), "gate failed");
                        gate_states.insert(gate.id.clone(), GateStatus::Failed);
                        collect_failures(gate, &evaluation, &mut failing);
                    }
                }

                if failing.is_empty() {
                    machine.current_mut().record_gates_passed()?;
                    run.step = PhaseStep::Advancing;
                    self.record_run(run).await?;
                    break;
                }

                match machine
                    .current_mut()
                    .record_gates_failed(self.config.remediation_bound())?
                {
                    RemediationOutcome::Escalate => {
                        let reasons: Vec<String> =
                            failing.iter().map(|(r, _)| r.clone()).collect();
                        warn!(
                            run = %run.id,
                            %phase,
                            cycles = machine.current().remediation_cycles,
                            "remediation bound reached; blocking run"
                        );
                        run.status = RunStatus::Blocked {
                            reason: format!(
                                "remediation bound reached in {phase}: {}",
                                reasons.join("; ")
                            ),
                        };
                        self.record_run(run).await?;
                        return Ok(run.status.clone());
                    }
                    RemediationOutcome::Remediate => {
                        run.step = PhaseStep::Remediating;
                        self.record_run(run).await?;
                        tasks = remediation_tasks(run.id, plan, &failing);
                        info!(
                            run = %run.id,
                            %phase,
                            cycle = machine.current().remediation_cycles,
                            tasks = tasks.len(),
                            "remediating unmet criteria"
                        );
                    }
                }
            }

            match machine.advance()? {
                Some(next) => {
                    info!(run = %run.id, from = %phase, to = %next, "phase advanced");
                    run.phase = next;
                    run.step = PhaseStep::Planning;
                }
                None => {
                    run.status = RunStatus::Completed;
                    self.record_run(run).await?;
                    info!(run = %run.id, "run completed");
                    return Ok(RunStatus::Completed);
                }
            }
        }
    }

    /// Submit the phase's tasks and wait for every delegation to reach a
    /// terminal status. Failed delegations are not fatal here: the gates
    /// will see their missing evidence and drive remediation.
    async fn run_delegations(&self, tasks: Vec<TaskSpec>) -> Result<(), EngineError> {
        let mut roles_by_task: HashMap<Uuid, String> = HashMap::new();
        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            roles_by_task.insert(task.id, task.role.clone());
            handles.push(self.dispatcher.submit(task)?);
        }

        let outcomes = futures::future::join_all(handles.into_iter().map(|handle| {
            let task_id = handle.task_id();
            async move { (task_id, handle.wait().await) }
        }))
        .await;

        for (task_id, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    let role = roles_by_task
                        .get(&task_id)
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string());
                    self.persist_result(&role, result).await?;
                }
                Err(err) if err.is_cancellation() => {
                    return Err(EngineError::Dispatch(err));
                }
                Err(err) => {
                    warn!(task = %task_id, error = %err, "delegation failed; gates will see missing evidence");
                }
            }
        }

        Ok(())
    }

    /// Persist a boomerang result: deliverables under their own keys, the
    /// returned context entries, and any risks or follow-ups for operator
    /// visibility. Ownership of the result ends here.
    async fn persist_result(
        &self,
        role: &str,
        result: DelegationResult,
    ) -> Result<(), EngineError> {
        for (key, content) in result.deliverables {
            self.put_with_backoff(EntryDraft::new(key, DELIVERABLES_DOMAIN, content), role)
                .await?;
        }
        for draft in result.entries {
            self.put_with_backoff(draft, role).await?;
        }
        if !result.risks.is_empty() {
            self.put_with_backoff(
                EntryDraft::new(
                    format!("risks/{}", result.task_id),
                    "risks",
                    json!(result.risks),
                ),
                role,
            )
            .await?;
        }
        if !result.follow_ups.is_empty() {
            self.put_with_backoff(
                EntryDraft::new(
                    format!("followups/{}", result.task_id),
                    "followups",
                    json!(result.follow_ups),
                ),
                role,
            )
            .await?;
        }
        Ok(())
    }

    async fn evaluate_gate(
        &self,
        gate: &Gate,
        run_id: Uuid,
    ) -> Result<GateEvaluation, EngineError> {
        let attempts = self.config.store_attempts();
        let mut attempt = 1u32;
        loop {
            match self.validator.evaluate_and_record(gate, &self.store, run_id) {
                Ok(evaluation) => return Ok(evaluation),
                Err(err) if err.is_unavailable() && attempt < attempts => {
                    warn!(gate = %gate.id, attempt, error = %err, "store unavailable during gate evaluation; retrying");
                    tokio::time::sleep(self.config.store_retry.backoff_for(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Append with bounded backoff on infrastructure faults. Conflicts
    /// cannot occur here: `put` re-reads the base under the store lock.
    async fn put_with_backoff(
        &self,
        draft: EntryDraft,
        author: &str,
    ) -> Result<ContextEntry, StoreError> {
        let attempts = self.config.store_attempts();
        let mut attempt = 1u32;
        loop {
            match self.store.put(draft.clone(), author) {
                Ok(entry) => return Ok(entry),
                Err(err) if err.is_unavailable() && attempt < attempts => {
                    warn!(key = %draft.key, attempt, error = %err, "store unavailable; retrying with backoff");
                    tokio::time::sleep(self.config.store_retry.backoff_for(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn record_run(&self, run: &ProjectRun) -> Result<(), EngineError> {
        let content = serde_json::to_value(RunTrace::of(run))
            .map_err(|e| StoreError::Unavailable(std::io::Error::other(e)))?;
        self.put_with_backoff(
            EntryDraft::new(run_key(run.id), PROGRESS_DOMAIN, content),
            CONTROLLER_AUTHOR,
        )
        .await?;
        Ok(())
    }

    /// Terminal record for paths where the store may already be the
    /// problem: log instead of propagating.
    pub(crate) async fn record_run_best_effort(&self, run: &ProjectRun) {
        if let Err(err) = self.record_run(run).await {
            error!(run = %run.id, error = %err, "failed to record terminal run state");
        }
    }
}

fn task_from_template(run_id: Uuid, template: &TaskTemplate) -> TaskSpec {
    TaskSpec::new(run_id, template.role.clone(), template.objective.clone())
        .with_inputs(template.inputs.clone())
        .with_deliverables(template.deliverables.clone())
}

/// Pair each non-passing criterion with its failure reason, in criterion
/// order.
fn collect_failures(gate: &Gate, evaluation: &GateEvaluation, failing: &mut Vec<(String, Criterion)>) {
    for (criterion, outcome) in gate.criteria.iter().zip(&evaluation.criteria) {
        if outcome.verdict == CriterionVerdict::Pass {
            continue;
        }
        let reason = match &outcome.detail {
            Some(detail) => format!("{}: {}", outcome.description, detail),
            None => outcome.description.clone(),
        };
        failing.push((reason, criterion.clone()));
    }
}

/// One remediation task per distinct failure reason, targeted at the
/// criterion's remediation role (or the phase's default role), asked to
/// produce the criterion's evidence keys.
fn remediation_tasks(
    run_id: Uuid,
    plan: &PhasePlan,
    failing: &[(String, Criterion)],
) -> Vec<TaskSpec> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();
    for (reason, criterion) in failing {
        if !seen.insert(reason.clone()) {
            continue;
        }
        let role = criterion
            .remediation_role
            .clone()
            .unwrap_or_else(|| plan.default_role.clone());
        let deliverables: Vec<String> =
            criterion.evidence.iter().map(|r| r.key.clone()).collect();
        tasks.push(
            TaskSpec::new(run_id, role, format!("Resolve unmet gate criterion: {reason}"))
                .with_deliverables(deliverables),
        );
    }
    tasks
}
