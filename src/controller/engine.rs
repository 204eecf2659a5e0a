//! The administrative control surface: start, abort, and inspect runs.

use cadence_common::{
    DelegationStatus, EntryDraft, GateEvaluation, PhaseKind, PhaseStep, ProjectRun, RunStatus,
    PROGRESS_DOMAIN,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::blueprint::Blueprint;
use crate::config::EngineConfig;
use crate::controller::runner::{run_key, RunController, RunTrace};
use crate::dispatch::{DispatchConfig, Dispatcher, RoleRegistry};
use crate::errors::EngineError;
use crate::gate::{gate_history, EvaluatorRegistry, GateValidator};
use crate::store::ContextStore;

/// Read-only view of a run, reconstructed from its persisted trace.
#[derive(Debug, Clone, Serialize)]
pub struct RunView {
    pub id: Uuid,
    pub goal: String,
    pub phase: PhaseKind,
    pub step: PhaseStep,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunView {
    /// Reconstruct a run's status purely from its `progress/run/<id>`
    /// history. No in-memory engine state is load-bearing here.
    pub fn from_store(store: &ContextStore, run_id: Uuid) -> Option<Self> {
        let history = store.history(&run_key(run_id));
        let first = history.first()?;
        let last = history.last()?;
        let trace: RunTrace = serde_json::from_value(last.content.clone()).ok()?;
        Some(Self {
            id: run_id,
            goal: trace.goal,
            phase: trace.phase,
            step: trace.step,
            status: trace.status,
            created_at: first.created_at,
            updated_at: last.created_at,
        })
    }

    /// Every run recorded in the store, oldest first.
    pub fn list(store: &ContextStore) -> Vec<Self> {
        let mut views: Vec<Self> = store
            .keys_with_prefix("progress/run/")
            .into_iter()
            .filter_map(|key| key.rsplit('/').next().and_then(|id| id.parse().ok()))
            .filter_map(|id| Self::from_store(store, id))
            .collect();
        views.sort_by_key(|v| v.created_at);
        views
    }
}

/// Reconstructed view of one delegation, assembled from its audit trail in
/// the `progress` domain.
#[derive(Debug, Clone, Serialize)]
pub struct DelegationView {
    pub task_id: Uuid,
    pub run_id: Uuid,
    pub role: String,
    pub status: DelegationStatus,
    /// Execution attempts observed so far.
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    /// Set once the delegation reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl DelegationView {
    /// Rebuild a delegation's lifecycle from `progress/task/<id>`.
    pub fn from_store(store: &ContextStore, task_id: Uuid) -> Option<Self> {
        let history = store.history(&format!("progress/task/{task_id}"));
        let first = history.first()?;
        let last = history.last()?;

        let run_id = first
            .content
            .pointer("/run_id")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())?;
        let role = first
            .content
            .pointer("/role")
            .and_then(|v| v.as_str())?
            .to_string();
        let status: DelegationStatus =
            serde_json::from_value(last.content.pointer("/status")?.clone()).ok()?;

        let attempts = history
            .iter()
            .filter_map(|e| serde_json::from_value::<DelegationStatus>(e.content.pointer("/status")?.clone()).ok())
            .filter(|s| matches!(s, DelegationStatus::InFlight { .. }))
            .count() as u32;

        Some(Self {
            task_id,
            run_id,
            role,
            completed_at: status.is_terminal().then_some(last.created_at),
            status,
            attempts,
            created_at: first.created_at,
        })
    }

    /// Every delegation recorded for a run, in submission order.
    pub fn for_run(store: &ContextStore, run_id: Uuid) -> Vec<Self> {
        let mut views: Vec<Self> = store
            .keys_with_prefix("progress/task/")
            .into_iter()
            .filter_map(|key| key.rsplit('/').next().and_then(|id| id.parse().ok()))
            .filter_map(|id| Self::from_store(store, id))
            .filter(|v| v.run_id == run_id)
            .collect();
        views.sort_by_key(|v| v.created_at);
        views
    }
}

struct RunRecord {
    handle: Option<JoinHandle<RunStatus>>,
}

/// The engine: owns the store, dispatcher, and run table, and exposes the
/// administrative surface a surrounding CLI or service needs.
pub struct Engine {
    store: Arc<ContextStore>,
    dispatcher: Dispatcher,
    registry: RoleRegistry,
    validator: GateValidator,
    config: EngineConfig,
    runs: Mutex<HashMap<Uuid, RunRecord>>,
}

impl Engine {
    /// Build an engine from configuration and a role registry. Opens the
    /// configured journal, replaying any prior state.
    pub fn new(config: EngineConfig, registry: RoleRegistry) -> Result<Self, EngineError> {
        let store = Arc::new(match &config.journal {
            Some(path) => ContextStore::open(path)?,
            None => ContextStore::in_memory(),
        });
        Ok(Self::with_store(config, registry, store))
    }

    /// Build an engine over an existing store (tests, embedding).
    pub fn with_store(
        config: EngineConfig,
        registry: RoleRegistry,
        store: Arc<ContextStore>,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            DispatchConfig::from_engine(&config),
            registry.clone(),
            Arc::clone(&store),
        );
        Self {
            store,
            dispatcher,
            registry,
            validator: GateValidator::new(),
            config,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Install custom named criterion evaluators.
    pub fn with_evaluators(mut self, evaluators: EvaluatorRegistry) -> Self {
        self.validator = GateValidator::with_registry(evaluators);
        self
    }

    pub fn store(&self) -> Arc<ContextStore> {
        Arc::clone(&self.store)
    }

    /// Start a run over a goal and blueprint. The run executes in the
    /// background; track it via `run_status` or block on `join_run`.
    pub fn start_run(&self, goal: &str, blueprint: Blueprint) -> Result<Uuid, EngineError> {
        blueprint.validate()?;
        let missing: Vec<String> = blueprint
            .referenced_roles()
            .into_iter()
            .filter(|role| !self.registry.contains(role))
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::BlueprintInvalid(format!(
                "blueprint references unregistered roles: {}",
                missing.join(", ")
            )));
        }

        let mut run = ProjectRun::new(goal);
        let run_id = run.id;
        let controller = RunController::new(
            Arc::clone(&self.store),
            self.dispatcher.clone(),
            self.validator.clone(),
            self.config.clone(),
        );

        let handle = tokio::spawn(async move {
            match controller.execute(&mut run, &blueprint).await {
                Ok(status) => status,
                Err(err) => {
                    error!(run = %run.id, error = %err, "run failed");
                    run.status = RunStatus::Failed {
                        error: err.to_string(),
                    };
                    controller.record_run_best_effort(&run).await;
                    run.status
                }
            }
        });

        self.runs
            .lock()
            .expect("run table lock")
            .insert(run_id, RunRecord { handle: Some(handle) });

        info!(run = %run_id, %goal, "run started");
        Ok(run_id)
    }

    /// Abort a run: cancel every in-flight delegation for it, stop the
    /// controller task, and record the terminal state.
    pub fn abort_run(&self, run_id: Uuid) -> Result<(), EngineError> {
        let handle = {
            let mut runs = self.runs.lock().expect("run table lock");
            let record = runs
                .get_mut(&run_id)
                .ok_or(EngineError::RunNotFound { id: run_id })?;
            record.handle.take()
        };

        self.dispatcher.cancel_run(run_id);
        if let Some(handle) = handle {
            handle.abort();
        }

        // Record the abort unless the run already reached a terminal state.
        if let Some(view) = RunView::from_store(&self.store, run_id)
            && !view.status.is_terminal()
        {
            let trace = RunTrace {
                goal: view.goal,
                phase: view.phase,
                step: view.step,
                status: RunStatus::Failed {
                    error: "aborted by operator".to_string(),
                },
            };
            let content = serde_json::to_value(&trace)
                .unwrap_or_else(|_| serde_json::json!({"status": {"state": "failed"}}));
            if let Err(err) = self.store.put(
                EntryDraft::new(run_key(run_id), PROGRESS_DOMAIN, content),
                "controller",
            ) {
                error!(run = %run_id, error = %err, "failed to record abort");
            }
        }

        info!(run = %run_id, "run aborted");
        Ok(())
    }

    /// Current view of a run, live or recovered.
    pub fn run_status(&self, run_id: Uuid) -> Result<RunView, EngineError> {
        RunView::from_store(&self.store, run_id).ok_or(EngineError::RunNotFound { id: run_id })
    }

    /// Every run the store knows about.
    pub fn list_runs(&self) -> Vec<RunView> {
        RunView::list(&self.store)
    }

    /// Wait for a run's controller task to finish, then return its view.
    pub async fn join_run(&self, run_id: Uuid) -> Result<RunView, EngineError> {
        let handle = {
            let mut runs = self.runs.lock().expect("run table lock");
            let record = runs
                .get_mut(&run_id)
                .ok_or(EngineError::RunNotFound { id: run_id })?;
            record.handle.take()
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.run_status(run_id)
    }

    /// Every delegation recorded for a run, in submission order.
    pub fn delegations(&self, run_id: Uuid) -> Vec<DelegationView> {
        DelegationView::for_run(&self.store, run_id)
    }

    /// Ordered evaluation history of one gate.
    pub fn gate_history(&self, run_id: Uuid, gate_id: &str) -> Vec<GateEvaluation> {
        gate_history(&self.store, run_id, gate_id)
    }

    /// Ordered evaluation history of every gate in a phase.
    pub fn phase_gate_history(&self, run_id: Uuid, phase: PhaseKind) -> Vec<GateEvaluation> {
        let mut evaluations: Vec<GateEvaluation> = self
            .store
            .keys_with_prefix(&format!("gates/{run_id}/"))
            .into_iter()
            .flat_map(|key| {
                self.store
                    .history(&key)
                    .into_iter()
                    .filter_map(|entry| serde_json::from_value(entry.content).ok())
            })
            .filter(|e: &GateEvaluation| e.phase == phase)
            .collect();
        evaluations.sort_by_key(|e| e.evaluated_at);
        evaluations
    }
}
