//! Phase state machine: the fixed Specification → Pseudocode →
//! Architecture → Refinement → Completion progression, with per-phase
//! sub-steps and bounded remediation cycles.
//!
//! The machine validates transitions; the controller decides when to take
//! them. Gate outcomes drive `advancing` vs `remediating`, and the advance
//! of a phase fires at most once no matter how often its gates are
//! re-evaluated.

use cadence_common::{PhaseKind, PhaseStep};
use serde::{Deserialize, Serialize};

use crate::errors::PhaseError;

/// What the machine decided after a gate failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// Loop back to delegating with remediation tasks.
    Remediate,
    /// The remediation bound is exhausted; escalate the run to blocked.
    Escalate,
}

/// One phase's live state within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseInstance {
    pub kind: PhaseKind,
    pub step: PhaseStep,
    /// Completed remediation cycles in this phase.
    pub remediation_cycles: u32,
    advanced: bool,
}

impl PhaseInstance {
    fn new(kind: PhaseKind) -> Self {
        Self {
            kind,
            step: PhaseStep::Planning,
            remediation_cycles: 0,
            advanced: false,
        }
    }

    /// Whether this phase's advance has already fired.
    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    fn invalid(&self, to: PhaseStep) -> PhaseError {
        PhaseError::InvalidTransition {
            phase: self.kind.to_string(),
            from: self.step.to_string(),
            to: to.to_string(),
        }
    }

    /// `planning → delegating` (or `remediating → delegating` when looping
    /// back with remediation tasks). Requires a non-empty task set.
    pub fn begin_delegating(&mut self, task_count: usize) -> Result<(), PhaseError> {
        if !matches!(self.step, PhaseStep::Planning | PhaseStep::Remediating) {
            return Err(self.invalid(PhaseStep::Delegating));
        }
        if task_count == 0 {
            return Err(PhaseError::EmptyTaskSet {
                phase: self.kind.to_string(),
            });
        }
        self.step = PhaseStep::Delegating;
        Ok(())
    }

    /// `delegating → gate_checking` once every task reached a terminal
    /// delegation status.
    pub fn begin_gate_check(&mut self) -> Result<(), PhaseError> {
        if self.step != PhaseStep::Delegating {
            return Err(self.invalid(PhaseStep::GateChecking));
        }
        self.step = PhaseStep::GateChecking;
        Ok(())
    }

    /// `gate_checking → advancing`. Fires at most once per phase instance.
    pub fn record_gates_passed(&mut self) -> Result<(), PhaseError> {
        if self.step != PhaseStep::GateChecking {
            return Err(self.invalid(PhaseStep::Advancing));
        }
        if self.advanced {
            return Err(PhaseError::AlreadyAdvanced {
                phase: self.kind.to_string(),
            });
        }
        self.advanced = true;
        self.step = PhaseStep::Advancing;
        Ok(())
    }

    /// `gate_checking → remediating`, bounded by `max_cycles`.
    pub fn record_gates_failed(
        &mut self,
        max_cycles: u32,
    ) -> Result<RemediationOutcome, PhaseError> {
        if self.step != PhaseStep::GateChecking {
            return Err(self.invalid(PhaseStep::Remediating));
        }
        if self.remediation_cycles >= max_cycles {
            return Ok(RemediationOutcome::Escalate);
        }
        self.remediation_cycles += 1;
        self.step = PhaseStep::Remediating;
        Ok(RemediationOutcome::Remediate)
    }
}

/// The fixed, ordered phase sequence of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseMachine {
    phases: Vec<PhaseInstance>,
    current: usize,
    completed: bool,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            phases: PhaseKind::ALL.iter().map(|k| PhaseInstance::new(*k)).collect(),
            current: 0,
            completed: false,
        }
    }

    pub fn current(&self) -> &PhaseInstance {
        &self.phases[self.current]
    }

    pub fn current_mut(&mut self) -> &mut PhaseInstance {
        &mut self.phases[self.current]
    }

    /// Whether the final phase has advanced.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Move the phase pointer forward after an `advancing` step.
    ///
    /// Returns the next phase, or `None` when the last phase advanced and
    /// the run is complete.
    pub fn advance(&mut self) -> Result<Option<PhaseKind>, PhaseError> {
        let instance = &self.phases[self.current];
        if instance.step != PhaseStep::Advancing {
            return Err(PhaseError::InvalidTransition {
                phase: instance.kind.to_string(),
                from: instance.step.to_string(),
                to: "next phase".to_string(),
            });
        }

        if self.current + 1 < self.phases.len() {
            self.current += 1;
            Ok(Some(self.phases[self.current].kind))
        } else {
            self.completed = true;
            Ok(None)
        }
    }
}
