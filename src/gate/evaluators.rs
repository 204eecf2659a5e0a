//! Criterion evaluators: predicates over resolved evidence entries.
//!
//! Built-ins cover the mechanical checks gates need (existence, domain
//! population, numeric thresholds, content patterns); anything else plugs in
//! through the registry under a name referenced by
//! `EvaluatorSpec::Named`.

use anyhow::{bail, Result};
use cadence_common::ContextEntry;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// A predicate over a criterion's resolved evidence.
///
/// `Ok(true)` passes, `Ok(false)` fails the criterion, and `Err` marks the
/// evaluator itself as malfunctioning (`EvaluatorError` verdict).
pub trait CriterionEvaluator: Send + Sync {
    fn evaluate(&self, evidence: &[ContextEntry]) -> Result<bool>;
}

/// Named evaluators available to `EvaluatorSpec::Named` criteria.
#[derive(Clone, Default)]
pub struct EvaluatorRegistry {
    evaluators: HashMap<String, Arc<dyn CriterionEvaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an evaluator under a name. Later registrations win.
    pub fn register(&mut self, name: &str, evaluator: Arc<dyn CriterionEvaluator>) {
        self.evaluators.insert(name.to_string(), evaluator);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CriterionEvaluator>> {
        self.evaluators.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.evaluators.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Passes when every evidence entry exists with non-empty content.
pub struct ExistsEvaluator;

impl CriterionEvaluator for ExistsEvaluator {
    fn evaluate(&self, evidence: &[ContextEntry]) -> Result<bool> {
        Ok(!evidence.is_empty() && evidence.iter().all(|e| !e.is_empty_content()))
    }
}

/// Passes when the evidence set (the domain's latest entries) is non-empty.
pub struct DomainNonEmptyEvaluator;

impl CriterionEvaluator for DomainNonEmptyEvaluator {
    fn evaluate(&self, evidence: &[ContextEntry]) -> Result<bool> {
        Ok(!evidence.is_empty())
    }
}

/// Passes when a numeric field in the first evidence entry meets a minimum.
pub struct NumericAtLeastEvaluator {
    pointer: String,
    min: f64,
}

impl NumericAtLeastEvaluator {
    pub fn new(pointer: &str, min: f64) -> Self {
        Self {
            pointer: pointer.to_string(),
            min,
        }
    }
}

impl CriterionEvaluator for NumericAtLeastEvaluator {
    fn evaluate(&self, evidence: &[ContextEntry]) -> Result<bool> {
        let Some(entry) = evidence.first() else {
            bail!("criterion declares no evidence to inspect");
        };
        let Some(field) = entry.content.pointer(&self.pointer) else {
            bail!("pointer {} not found in evidence {}", self.pointer, entry.key);
        };
        let Some(value) = field.as_f64() else {
            bail!("field at {} in evidence {} is not numeric", self.pointer, entry.key);
        };
        Ok(value >= self.min)
    }
}

/// Passes when every evidence entry's content matches the pattern.
///
/// String content is matched directly; other JSON values are matched
/// against their serialized form.
pub struct ContentMatchesEvaluator {
    pattern: String,
}

impl ContentMatchesEvaluator {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
        }
    }
}

impl CriterionEvaluator for ContentMatchesEvaluator {
    fn evaluate(&self, evidence: &[ContextEntry]) -> Result<bool> {
        let regex = Regex::new(&self.pattern)
            .map_err(|e| anyhow::anyhow!("invalid pattern {:?}: {}", self.pattern, e))?;
        if evidence.is_empty() {
            bail!("criterion declares no evidence to inspect");
        }
        Ok(evidence.iter().all(|e| {
            let text = match &e.content {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            regex.is_match(&text)
        }))
    }
}
