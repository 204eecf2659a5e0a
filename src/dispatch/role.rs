//! The role invocation interface: one capability trait plus a registry
//! mapping role names to implementations.

use async_trait::async_trait;
use cadence_common::{ContextEntry, DelegationResult, TaskSpec};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// What a role receives for one execution attempt.
///
/// The context is a read-only snapshot resolved from the store at dispatch
/// time, not a live reference. Roles never touch the store directly; all
/// persistence flows back through the controller via the returned
/// [`DelegationResult`].
pub struct RoleInput {
    pub spec: TaskSpec,
    pub context: Vec<ContextEntry>,
    cancelled: watch::Receiver<bool>,
}

impl RoleInput {
    pub fn new(spec: TaskSpec, context: Vec<ContextEntry>, cancelled: watch::Receiver<bool>) -> Self {
        Self {
            spec,
            context,
            cancelled,
        }
    }

    /// Whether cancellation has been requested. Cooperative roles check
    /// this between units of work and return early.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// A clone of the cancel signal, for roles that want to `select!` on it.
    pub fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.cancelled.clone()
    }

    /// Look up a snapshot entry by key.
    pub fn context_entry(&self, key: &str) -> Option<&ContextEntry> {
        self.context.iter().find(|e| e.key == key)
    }
}

/// A named capability provider tasks are delegated to.
#[async_trait]
pub trait Role: Send + Sync {
    /// Execute one task. An `Err` is an execution error and is retried per
    /// policy; a returned result with `success: false` is a deliberate
    /// business outcome and is delivered as-is.
    async fn execute(&self, input: RoleInput) -> anyhow::Result<DelegationResult>;
}

/// Registry mapping role names to implementations.
#[derive(Clone, Default)]
pub struct RoleRegistry {
    roles: HashMap<String, Arc<dyn Role>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a role under a name. Later registrations win.
    pub fn register(&mut self, name: &str, role: Arc<dyn Role>) {
        self.roles.insert(name.to_string(), role);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Role>> {
        self.roles.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.roles.keys().cloned().collect();
        names.sort();
        names
    }
}

struct FnRole<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Role for FnRole<F>
where
    F: Fn(RoleInput) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<DelegationResult>> + Send,
{
    async fn execute(&self, input: RoleInput) -> anyhow::Result<DelegationResult> {
        (self.f)(input).await
    }
}

/// Adapt an async closure into a [`Role`].
pub fn from_fn<F, Fut>(f: F) -> Arc<dyn Role>
where
    F: Fn(RoleInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<DelegationResult>> + Send + 'static,
{
    Arc::new(FnRole { f })
}
