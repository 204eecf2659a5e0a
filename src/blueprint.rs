//! Blueprints: the declarative per-phase plan a run executes.
//!
//! A blueprint names, for each of the five phases, the tasks to delegate
//! and the gates that must pass before the phase advances. Blueprints load
//! from and save to JSON; [`Blueprint::standard`] generates a minimal
//! five-phase plan from just a goal.

use anyhow::{Context, Result};
use cadence_common::{ContextRef, Criterion, EvaluatorSpec, Gate, PhaseKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::errors::EngineError;

/// Template for one task to delegate during a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    /// Role the task is routed to.
    pub role: String,
    /// What the role is asked to produce.
    pub objective: String,
    /// Context entries the role receives as input.
    #[serde(default)]
    pub inputs: Vec<ContextRef>,
    /// Deliverable keys the role is expected to return. These double as
    /// the store keys the controller persists the deliverables under.
    #[serde(default)]
    pub deliverables: Vec<String>,
}

/// Plan for one phase: its tasks and the gates guarding its boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePlan {
    pub phase: PhaseKind,
    /// Role remediation tasks fall back to when a criterion names none.
    pub default_role: String,
    pub tasks: Vec<TaskTemplate>,
    #[serde(default)]
    pub gates: Vec<Gate>,
}

/// The full declarative plan for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub phases: Vec<PhasePlan>,
}

impl Blueprint {
    /// Load a blueprint from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read blueprint file: {}", path.display()))?;

        let blueprint: Blueprint = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse blueprint JSON: {}", path.display()))?;

        Ok(blueprint)
    }

    /// Save the blueprint to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize blueprint to JSON")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write blueprint file: {}", path.display()))?;

        Ok(())
    }

    /// The plan for one phase, if the blueprint defines it.
    pub fn plan_for(&self, phase: PhaseKind) -> Option<&PhasePlan> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Check structural soundness: every phase planned exactly once and in
    /// order, every phase has tasks, gates well-formed with unique ids.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut problems = Vec::new();

        let planned: Vec<PhaseKind> = self.phases.iter().map(|p| p.phase).collect();
        if planned != PhaseKind::ALL {
            problems.push(format!(
                "blueprint must plan all five phases in order, found: [{}]",
                planned
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        let mut gate_ids = HashSet::new();
        for plan in &self.phases {
            if plan.tasks.is_empty() {
                problems.push(format!("phase {} has no tasks", plan.phase));
            }
            if plan.default_role.trim().is_empty() {
                problems.push(format!("phase {} has no default role", plan.phase));
            }
            for task in &plan.tasks {
                if task.role.trim().is_empty() {
                    problems.push(format!("phase {} has a task with an empty role", plan.phase));
                }
            }
            for gate in &plan.gates {
                if gate.phase != plan.phase {
                    problems.push(format!(
                        "gate {} declares phase {} but is planned under {}",
                        gate.id, gate.phase, plan.phase
                    ));
                }
                if gate.criteria.is_empty() {
                    problems.push(format!("gate {} has no criteria", gate.id));
                }
                if !gate_ids.insert(gate.id.clone()) {
                    problems.push(format!("duplicate gate id {}", gate.id));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::BlueprintInvalid(problems.join("; ")))
        }
    }

    /// Every role the blueprint references, tasks and remediation targets
    /// alike.
    pub fn referenced_roles(&self) -> Vec<String> {
        let mut roles = HashSet::new();
        for plan in &self.phases {
            roles.insert(plan.default_role.clone());
            for task in &plan.tasks {
                roles.insert(task.role.clone());
            }
            for gate in &plan.gates {
                for criterion in &gate.criteria {
                    if let Some(role) = &criterion.remediation_role {
                        roles.insert(role.clone());
                    }
                }
            }
        }
        let mut roles: Vec<String> = roles.into_iter().collect();
        roles.sort();
        roles
    }

    /// A minimal five-phase plan: one task and one existence gate per
    /// phase, each phase consuming the previous phase's deliverable.
    pub fn standard(goal: &str) -> Self {
        let stages: [(PhaseKind, &str, &str, &str); 5] = [
            (
                PhaseKind::Specification,
                "analyst",
                "spec/requirements",
                "Capture the requirements for: ",
            ),
            (
                PhaseKind::Pseudocode,
                "planner",
                "plan/pseudocode",
                "Outline the solution logic for: ",
            ),
            (
                PhaseKind::Architecture,
                "architect",
                "architecture/design",
                "Design the system structure for: ",
            ),
            (
                PhaseKind::Refinement,
                "implementer",
                "refinement/report",
                "Implement and refine: ",
            ),
            (
                PhaseKind::Completion,
                "integrator",
                "release/summary",
                "Integrate and finalize: ",
            ),
        ];

        let mut phases = Vec::with_capacity(stages.len());
        let mut previous_deliverable: Option<String> = None;

        for (phase, role, deliverable, objective_prefix) in stages {
            let inputs = previous_deliverable
                .take()
                .map(|key| vec![ContextRef::latest(key)])
                .unwrap_or_default();

            phases.push(PhasePlan {
                phase,
                default_role: role.to_string(),
                tasks: vec![TaskTemplate {
                    role: role.to_string(),
                    objective: format!("{objective_prefix}{goal}"),
                    inputs,
                    deliverables: vec![deliverable.to_string()],
                }],
                gates: vec![Gate::new(
                    format!("{}-complete", phase.as_str()),
                    phase,
                    format!("{} deliverable present", phase.as_str()),
                )
                .with_criterion(
                    Criterion::new(
                        format!("{deliverable} exists and is non-empty"),
                        EvaluatorSpec::Exists,
                    )
                    .with_evidence(vec![ContextRef::latest(deliverable)])
                    .with_remediation_role(role),
                )],
            });

            previous_deliverable = Some(deliverable.to_string());
        }

        Self { phases }
    }
}
