//! Engine configuration: retry policy, cancellation grace, remediation
//! bounds, and per-role concurrency limits.
//!
//! Loaded from a `cadence.toml` file when present; every field has a default
//! so an empty file (or no file) yields a working configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default maximum execution attempts per delegation.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base for exponential retry backoff.
const DEFAULT_BACKOFF_MS: u64 = 200;

/// Default cap on a single backoff sleep.
const DEFAULT_BACKOFF_CAP_MS: u64 = 5_000;

/// Default grace period for cooperative cancellation.
const DEFAULT_CANCEL_GRACE_MS: u64 = 2_000;

/// Default bound on remediation cycles before a run is escalated to blocked.
const DEFAULT_MAX_REMEDIATION_CYCLES: u32 = 5;

/// Default maximum concurrent in-flight delegations per role.
const DEFAULT_ROLE_LIMIT: usize = 1;

/// Retry policy for failed delegations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum execution attempts (first try included).
    pub max_attempts: u32,
    /// Base backoff in milliseconds; doubles per attempt.
    pub backoff_ms: u64,
    /// Upper bound on a single backoff sleep in milliseconds.
    pub backoff_cap_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            backoff_cap_ms: DEFAULT_BACKOFF_CAP_MS,
        }
    }
}

impl RetryPolicy {
    /// Backoff duration before retrying after `attempt` failed attempts.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let ms = self
            .backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.backoff_cap_ms);
        Duration::from_millis(ms)
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Journal file backing the context store. `None` keeps everything in
    /// memory (tests, dry runs).
    pub journal: Option<PathBuf>,
    /// Retry policy for role execution errors.
    pub retry: RetryPolicy,
    /// Retry policy for store infrastructure faults at the controller level.
    pub store_retry: RetryPolicy,
    /// Grace period in milliseconds for cooperative cancellation.
    pub cancel_grace_ms: Option<u64>,
    /// Remediation cycles allowed per phase before the run is blocked.
    pub max_remediation_cycles: Option<u32>,
    /// Concurrency limit applied to roles without an explicit entry.
    pub default_role_limit: Option<usize>,
    /// Per-role concurrency limits, keyed by role name.
    pub role_limits: HashMap<String, usize>,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// The `CADENCE_JOURNAL` environment variable overrides the journal path
    /// from the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML: {}", path.display()))?;

        if let Ok(journal) = std::env::var("CADENCE_JOURNAL")
            && !journal.is_empty()
        {
            config.journal = Some(PathBuf::from(journal));
        }

        Ok(config)
    }

    /// Set the journal path.
    pub fn with_journal(mut self, path: PathBuf) -> Self {
        self.journal = Some(path);
        self
    }

    /// Set the delegation retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the cancellation grace period.
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace_ms = Some(grace.as_millis() as u64);
        self
    }

    /// Set the remediation-cycle bound.
    pub fn with_max_remediation_cycles(mut self, max: u32) -> Self {
        self.max_remediation_cycles = Some(max);
        self
    }

    /// Set the concurrency limit for a specific role.
    pub fn with_role_limit(mut self, role: &str, limit: usize) -> Self {
        self.role_limits.insert(role.to_string(), limit.max(1));
        self
    }

    /// Set the default per-role concurrency limit.
    pub fn with_default_role_limit(mut self, limit: usize) -> Self {
        self.default_role_limit = Some(limit.max(1));
        self
    }

    /// Effective concurrency limit for a role.
    pub fn role_limit(&self, role: &str) -> usize {
        self.role_limits
            .get(role)
            .copied()
            .unwrap_or_else(|| self.default_role_limit.unwrap_or(DEFAULT_ROLE_LIMIT))
            .max(1)
    }

    /// Effective cancellation grace period.
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms.unwrap_or(DEFAULT_CANCEL_GRACE_MS))
    }

    /// Effective remediation-cycle bound.
    pub fn remediation_bound(&self) -> u32 {
        self.max_remediation_cycles
            .unwrap_or(DEFAULT_MAX_REMEDIATION_CYCLES)
    }

    /// Effective store retry attempts.
    pub fn store_attempts(&self) -> u32 {
        self.store_retry.max_attempts.max(1)
    }
}
