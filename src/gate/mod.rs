//! Gate validation: checklist contracts evaluated against context-store
//! evidence at phase boundaries.
//!
//! A gate is binary: it passes only when every criterion passes. Missing
//! evidence fails the criterion; a malfunctioning evaluator yields the
//! distinct `EvaluatorError` verdict so operators can tell broken gate
//! definitions from unmet work.

mod evaluators;
mod validator;

pub use evaluators::{
    ContentMatchesEvaluator, CriterionEvaluator, DomainNonEmptyEvaluator, EvaluatorRegistry,
    ExistsEvaluator, NumericAtLeastEvaluator,
};
pub use validator::{gate_history, gate_key, GateValidator};
