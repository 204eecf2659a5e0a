//! The delegation queue: per-role FIFO admission under concurrency limits,
//! retry with exponential backoff, and cancellation with a grace period.

use cadence_common::{DelegationResult, DelegationStatus, EntryDraft, TaskSpec, PROGRESS_DOMAIN};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, RetryPolicy};
use crate::dispatch::role::{Role, RoleInput, RoleRegistry};
use crate::errors::DispatchError;
use crate::store::ContextStore;

/// Author recorded on delegation audit entries.
const DISPATCHER_AUTHOR: &str = "dispatcher";

/// Dispatcher tuning: retry policy, cancellation grace, per-role limits.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub retry: RetryPolicy,
    pub cancel_grace: Duration,
    pub default_role_limit: usize,
    pub role_limits: HashMap<String, usize>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            cancel_grace: Duration::from_secs(2),
            default_role_limit: 1,
            role_limits: HashMap::new(),
        }
    }
}

impl DispatchConfig {
    /// Derive dispatcher settings from the engine configuration.
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            retry: config.retry.clone(),
            cancel_grace: config.cancel_grace(),
            default_role_limit: config.role_limit(""),
            role_limits: config.role_limits.clone(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn with_role_limit(mut self, role: &str, limit: usize) -> Self {
        self.role_limits.insert(role.to_string(), limit.max(1));
        self
    }

    fn role_limit(&self, role: &str) -> usize {
        self.role_limits
            .get(role)
            .copied()
            .unwrap_or(self.default_role_limit)
            .max(1)
    }
}

/// Handle on a submitted delegation. Awaiting it is the only suspension
/// point the controller sees.
#[derive(Debug)]
pub struct DelegationHandle {
    task_id: Uuid,
    run_id: Uuid,
    done: oneshot::Receiver<Result<DelegationResult, DispatchError>>,
}

impl DelegationHandle {
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Suspend until the delegation reaches a terminal status.
    pub async fn wait(self) -> Result<DelegationResult, DispatchError> {
        let task_id = self.task_id;
        self.done
            .await
            .unwrap_or(Err(DispatchError::ChannelClosed { task_id }))
    }
}

struct Admission {
    spec: TaskSpec,
    done: oneshot::Sender<Result<DelegationResult, DispatchError>>,
    cancel_rx: watch::Receiver<bool>,
}

struct Lane {
    limit: usize,
    running: usize,
    queue: VecDeque<Admission>,
}

struct CancelSlot {
    run_id: Uuid,
    signal: watch::Sender<bool>,
}

struct DispatcherInner {
    config: DispatchConfig,
    registry: RoleRegistry,
    store: Arc<ContextStore>,
    lanes: Mutex<HashMap<String, Lane>>,
    cancels: Mutex<HashMap<Uuid, CancelSlot>>,
}

impl DispatcherInner {
    /// Record a delegation state transition in the `progress` domain.
    ///
    /// Each transition lands as a new version of `progress/task/<id>`, so
    /// the store carries the full orchestration audit trail without any
    /// separate dispatcher persistence.
    fn record_transition(&self, spec: &TaskSpec, status: &DelegationStatus) {
        let content = json!({
            "task_id": spec.id,
            "run_id": spec.run_id,
            "role": spec.role,
            "status": status,
        });
        let draft = EntryDraft::new(format!("progress/task/{}", spec.id), PROGRESS_DOMAIN, content);
        if let Err(err) = self.store.put(draft, DISPATCHER_AUTHOR) {
            warn!(task = %spec.id, error = %err, "failed to record delegation transition");
        }
    }
}

/// Routes task specs to registered roles and collects their boomerang
/// results.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig, registry: RoleRegistry, store: Arc<ContextStore>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                config,
                registry,
                store,
                lanes: Mutex::new(HashMap::new()),
                cancels: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Enqueue a task for its role. Admission is strictly FIFO per role;
    /// tasks beyond the role's concurrency limit wait their turn.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, spec: TaskSpec) -> Result<DelegationHandle, DispatchError> {
        let role = self
            .inner
            .registry
            .get(&spec.role)
            .ok_or_else(|| DispatchError::UnknownRole {
                role: spec.role.clone(),
            })?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (done_tx, done_rx) = oneshot::channel();
        let handle = DelegationHandle {
            task_id: spec.id,
            run_id: spec.run_id,
            done: done_rx,
        };

        self.inner.record_transition(&spec, &DelegationStatus::Pending);
        self.inner.cancels.lock().expect("cancel table lock").insert(
            spec.id,
            CancelSlot {
                run_id: spec.run_id,
                signal: cancel_tx,
            },
        );

        let admission = Admission {
            spec,
            done: done_tx,
            cancel_rx,
        };

        let admitted = {
            let mut lanes = self.inner.lanes.lock().expect("lane table lock");
            let lane = lanes
                .entry(admission.spec.role.clone())
                .or_insert_with(|| Lane {
                    limit: self.inner.config.role_limit(&admission.spec.role),
                    running: 0,
                    queue: VecDeque::new(),
                });
            if lane.running < lane.limit {
                lane.running += 1;
                Some(admission)
            } else {
                debug!(
                    task = %admission.spec.id,
                    role = %admission.spec.role,
                    queued = lane.queue.len() + 1,
                    "role at concurrency limit; queueing"
                );
                lane.queue.push_back(admission);
                None
            }
        };

        if let Some(admission) = admitted {
            spawn_delegation(Arc::clone(&self.inner), role, admission);
        }

        Ok(handle)
    }

    /// Request cooperative cancellation of one delegation. Queued tasks are
    /// removed immediately; in-flight tasks get the signal and a grace
    /// period to acknowledge.
    pub fn cancel(&self, task_id: Uuid) {
        // Still queued? Remove it without ever starting.
        let queued = {
            let mut lanes = self.inner.lanes.lock().expect("lane table lock");
            lanes.values_mut().find_map(|lane| {
                lane.queue
                    .iter()
                    .position(|a| a.spec.id == task_id)
                    .and_then(|idx| lane.queue.remove(idx))
            })
        };

        if let Some(admission) = queued {
            self.inner.record_transition(
                &admission.spec,
                &DelegationStatus::Cancelled {
                    reason: "cancelled while queued".to_string(),
                },
            );
            self.inner.cancels.lock().expect("cancel table lock").remove(&task_id);
            let _ = admission.done.send(Err(DispatchError::Cancelled { task_id }));
            return;
        }

        if let Some(slot) = self.inner.cancels.lock().expect("cancel table lock").get(&task_id) {
            let _ = slot.signal.send(true);
        }
    }

    /// Cancel every pending and in-flight delegation belonging to a run.
    pub fn cancel_run(&self, run_id: Uuid) {
        let task_ids: Vec<Uuid> = {
            let cancels = self.inner.cancels.lock().expect("cancel table lock");
            cancels
                .iter()
                .filter(|(_, slot)| slot.run_id == run_id)
                .map(|(id, _)| *id)
                .collect()
        };
        for task_id in task_ids {
            self.cancel(task_id);
        }
    }
}

fn spawn_delegation(inner: Arc<DispatcherInner>, role: Arc<dyn Role>, admission: Admission) {
    tokio::spawn(async move {
        let Admission {
            spec,
            done,
            cancel_rx,
        } = admission;
        let role_name = spec.role.clone();
        let task_id = spec.id;

        let outcome = run_delegation(&inner, role, spec, cancel_rx).await;
        let _ = done.send(outcome);

        inner.cancels.lock().expect("cancel table lock").remove(&task_id);
        admit_next(&inner, &role_name);
    });
}

/// Free the finished task's slot and admit the next queued task, if any.
fn admit_next(inner: &Arc<DispatcherInner>, role_name: &str) {
    let next = {
        let mut lanes = inner.lanes.lock().expect("lane table lock");
        let Some(lane) = lanes.get_mut(role_name) else {
            return;
        };
        lane.running = lane.running.saturating_sub(1);
        if lane.running < lane.limit {
            let admission = lane.queue.pop_front();
            if admission.is_some() {
                lane.running += 1;
            }
            admission
        } else {
            None
        }
    };

    if let Some(admission) = next {
        match inner.registry.get(role_name) {
            Some(role) => spawn_delegation(Arc::clone(inner), role, admission),
            None => {
                // Registry is immutable after construction, so this cannot
                // happen for a task that passed submit.
                let task_id = admission.spec.id;
                let _ = admission.done.send(Err(DispatchError::UnknownRole {
                    role: role_name.to_string(),
                }));
                inner.cancels.lock().expect("cancel table lock").remove(&task_id);
            }
        }
    }
}

async fn run_delegation(
    inner: &Arc<DispatcherInner>,
    role: Arc<dyn Role>,
    spec: TaskSpec,
    mut cancel_rx: watch::Receiver<bool>,
) -> Result<DelegationResult, DispatchError> {
    let task_id = spec.id;
    let max_attempts = inner.config.retry.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        if *cancel_rx.borrow() {
            inner.record_transition(
                &spec,
                &DelegationStatus::Cancelled {
                    reason: "cancelled before start".to_string(),
                },
            );
            return Err(DispatchError::Cancelled { task_id });
        }

        inner.record_transition(&spec, &DelegationStatus::InFlight { attempt });

        // Resolve the read-only input snapshot at dispatch time. Retries
        // re-resolve so a remediated store read feeds the next attempt.
        let attempt_outcome: Result<DelegationResult, String> =
            match inner.store.resolve(&spec.inputs) {
                Ok(context) => {
                    let input = RoleInput::new(spec.clone(), context, cancel_rx.clone());
                    let mut fut = role.execute(input);
                    tokio::select! {
                        res = &mut fut => res.map_err(|e| e.to_string()),
                        _ = wait_for_cancel(&mut cancel_rx) => {
                            return finish_cancelled(inner, &spec, fut).await;
                        }
                    }
                }
                Err(err) => Err(err.to_string()),
            };

        match attempt_outcome {
            Ok(mut result) => {
                // Results always attribute to the spec's id so re-submitted
                // attempts stay idempotent downstream.
                result.task_id = task_id;
                inner.record_transition(&spec, &DelegationStatus::Returned);
                debug!(task = %task_id, role = %spec.role, attempt, success = result.success, "delegation returned");
                return Ok(result);
            }
            Err(reason) => {
                warn!(task = %task_id, role = %spec.role, attempt, %reason, "delegation attempt failed");
                if attempt >= max_attempts {
                    inner.record_transition(
                        &spec,
                        &DelegationStatus::Failed {
                            reason: reason.clone(),
                        },
                    );
                    return Err(DispatchError::DelegationFailed {
                        task_id,
                        attempts: attempt,
                        reason,
                    });
                }

                let backoff = inner.config.retry.backoff_for(attempt);
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = wait_for_cancel(&mut cancel_rx) => {
                        inner.record_transition(
                            &spec,
                            &DelegationStatus::Cancelled {
                                reason: "cancelled during retry backoff".to_string(),
                            },
                        );
                        return Err(DispatchError::Cancelled { task_id });
                    }
                }
                attempt += 1;
            }
        }
    }
}

/// Wait out the grace period for a role to acknowledge cancellation.
///
/// A role that finishes in time is cleanly cancelled and its late result
/// discarded; one that does not is cut off with `CancellationTimeout`. The
/// slot is freed either way: the dispatcher only promises to stop waiting,
/// not to kill external work.
async fn finish_cancelled<F>(
    inner: &Arc<DispatcherInner>,
    spec: &TaskSpec,
    fut: F,
) -> Result<DelegationResult, DispatchError>
where
    F: std::future::Future<Output = anyhow::Result<DelegationResult>>,
{
    let task_id = spec.id;
    match tokio::time::timeout(inner.config.cancel_grace, fut).await {
        Ok(_discarded) => {
            inner.record_transition(
                spec,
                &DelegationStatus::Cancelled {
                    reason: "cancelled".to_string(),
                },
            );
            Err(DispatchError::Cancelled { task_id })
        }
        Err(_elapsed) => {
            inner.record_transition(
                spec,
                &DelegationStatus::Cancelled {
                    reason: "cancellation_timeout".to_string(),
                },
            );
            Err(DispatchError::CancellationTimeout { task_id })
        }
    }
}

async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without a cancel; never resolves.
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::role::from_fn;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn dispatcher_with(
        config: DispatchConfig,
        roles: Vec<(&str, Arc<dyn Role>)>,
    ) -> (Dispatcher, Arc<ContextStore>) {
        let store = Arc::new(ContextStore::in_memory());
        let mut registry = RoleRegistry::new();
        for (name, role) in roles {
            registry.register(name, role);
        }
        (Dispatcher::new(config, registry, Arc::clone(&store)), store)
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_ms: 10,
            backoff_cap_ms: 50,
        }
    }

    fn spec(run_id: Uuid, role: &str) -> TaskSpec {
        TaskSpec::new(run_id, role, "test objective")
    }

    fn trail_labels(store: &ContextStore, task_id: Uuid) -> Vec<String> {
        store
            .history(&format!("progress/task/{task_id}"))
            .into_iter()
            .filter_map(|e| {
                e.content
                    .pointer("/status/state")
                    .and_then(|v| v.as_str())
                    .map(String::from)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let (dispatcher, _store) = dispatcher_with(DispatchConfig::default(), vec![]);
        let err = dispatcher.submit(spec(Uuid::new_v4(), "ghost")).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownRole { .. }));
    }

    #[tokio::test]
    async fn test_successful_delegation_records_full_trail() {
        let role = from_fn(|input: RoleInput| async move {
            Ok(DelegationResult::success(input.spec.id).with_deliverable("out", json!("ok")))
        });
        let (dispatcher, store) = dispatcher_with(DispatchConfig::default(), vec![("worker", role)]);

        let task = spec(Uuid::new_v4(), "worker");
        let task_id = task.id;
        let result = dispatcher.submit(task).unwrap().wait().await.unwrap();

        assert!(result.success);
        assert_eq!(result.task_id, task_id);
        assert_eq!(
            trail_labels(&store, task_id),
            vec!["pending", "in_flight", "returned"]
        );
    }

    #[tokio::test]
    async fn test_role_error_is_retried_until_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let role = from_fn(move |input: RoleInput| {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    anyhow::bail!("transient failure");
                }
                Ok(DelegationResult::success(input.spec.id))
            }
        });

        let config = DispatchConfig::default().with_retry(fast_retry());
        let (dispatcher, store) = dispatcher_with(config, vec![("flaky", role)]);

        let task = spec(Uuid::new_v4(), "flaky");
        let task_id = task.id;
        let result = dispatcher.submit(task).unwrap().wait().await.unwrap();

        assert!(result.success);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Same task id across attempts: one audit key, three in_flight marks.
        let trail = trail_labels(&store, task_id);
        assert_eq!(
            trail,
            vec!["pending", "in_flight", "in_flight", "in_flight", "returned"]
        );
    }

    #[tokio::test]
    async fn test_retries_exhausted_marks_failed() {
        let role = from_fn(|_input: RoleInput| async move {
            Err(anyhow::anyhow!("persistent failure"))
        });

        let config = DispatchConfig::default().with_retry(fast_retry());
        let (dispatcher, store) = dispatcher_with(config, vec![("broken", role)]);

        let task = spec(Uuid::new_v4(), "broken");
        let task_id = task.id;
        let err = dispatcher.submit(task).unwrap().wait().await.unwrap_err();

        match err {
            DispatchError::DelegationFailed { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("Expected DelegationFailed, got {other}"),
        }
        assert_eq!(trail_labels(&store, task_id).last().map(String::as_str), Some("failed"));
    }

    #[tokio::test]
    async fn test_business_failure_is_not_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let role = from_fn(move |input: RoleInput| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(DelegationResult::failure(input.spec.id))
            }
        });

        let config = DispatchConfig::default().with_retry(fast_retry());
        let (dispatcher, _store) = dispatcher_with(config, vec![("judge", role)]);

        let result = dispatcher
            .submit(spec(Uuid::new_v4(), "judge"))
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fifo_admission_with_limit_one() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&order);
        let role = from_fn(move |input: RoleInput| {
            let sink = Arc::clone(&sink);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                sink.lock().unwrap().push(input.spec.objective.clone());
                Ok(DelegationResult::success(input.spec.id))
            }
        });

        let config = DispatchConfig::default().with_role_limit("solo", 1);
        let (dispatcher, _store) = dispatcher_with(config, vec![("solo", role)]);

        let run_id = Uuid::new_v4();
        let handles: Vec<_> = (0..3)
            .map(|i| {
                dispatcher
                    .submit(TaskSpec::new(run_id, "solo", format!("task-{i}")))
                    .unwrap()
            })
            .collect();

        for handle in handles {
            handle.wait().await.unwrap();
        }

        assert_eq!(
            *order.lock().unwrap(),
            vec!["task-0", "task-1", "task-2"]
        );
    }

    #[tokio::test]
    async fn test_cancel_queued_task_never_starts() {
        let role = from_fn(|input: RoleInput| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(DelegationResult::success(input.spec.id))
        });

        let config = DispatchConfig::default().with_role_limit("solo", 1);
        let (dispatcher, store) = dispatcher_with(config, vec![("solo", role)]);

        let run_id = Uuid::new_v4();
        let first = dispatcher.submit(spec(run_id, "solo")).unwrap();
        let second = dispatcher.submit(spec(run_id, "solo")).unwrap();
        let second_id = second.task_id();

        dispatcher.cancel(second_id);
        let err = second.wait().await.unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled { .. }));

        // The first task is unaffected.
        first.wait().await.unwrap();
        let trail = trail_labels(&store, second_id);
        assert_eq!(trail, vec!["pending", "cancelled"]);
    }

    #[tokio::test]
    async fn test_cooperative_cancellation_within_grace() {
        let role = from_fn(|input: RoleInput| async move {
            // Cooperative: poll the cancel signal between work units.
            for _ in 0..1_000 {
                if input.is_cancelled() {
                    return Ok(DelegationResult::failure(input.spec.id));
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Ok(DelegationResult::success(input.spec.id))
        });

        let config = DispatchConfig::default().with_cancel_grace(Duration::from_millis(500));
        let (dispatcher, store) = dispatcher_with(config, vec![("coop", role)]);

        let handle = dispatcher.submit(spec(Uuid::new_v4(), "coop")).unwrap();
        let task_id = handle.task_id();

        tokio::time::sleep(Duration::from_millis(20)).await;
        dispatcher.cancel(task_id);

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled { .. }));
        assert_eq!(trail_labels(&store, task_id).last().map(String::as_str), Some("cancelled"));
    }

    #[tokio::test]
    async fn test_unresponsive_role_hits_cancellation_timeout() {
        let role = from_fn(|input: RoleInput| async move {
            // Ignores the cancel signal entirely.
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(DelegationResult::success(input.spec.id))
        });

        let config = DispatchConfig::default().with_cancel_grace(Duration::from_millis(30));
        let (dispatcher, store) = dispatcher_with(config, vec![("stuck", role)]);

        let handle = dispatcher.submit(spec(Uuid::new_v4(), "stuck")).unwrap();
        let task_id = handle.task_id();

        tokio::time::sleep(Duration::from_millis(20)).await;
        dispatcher.cancel(task_id);

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, DispatchError::CancellationTimeout { .. }));

        let trail = store.history(&format!("progress/task/{task_id}"));
        let last = trail.last().unwrap();
        assert_eq!(
            last.content.pointer("/status/reason").and_then(|v| v.as_str()),
            Some("cancellation_timeout")
        );
    }

    #[tokio::test]
    async fn test_cancel_run_cascades_to_all_delegations() {
        let role = from_fn(|input: RoleInput| async move {
            std::future::pending::<()>().await;
            Ok(DelegationResult::success(input.spec.id))
        });

        let config = DispatchConfig::default()
            .with_role_limit("a", 2)
            .with_cancel_grace(Duration::from_millis(50));
        let (dispatcher, _store) = dispatcher_with(config, vec![("a", role)]);

        let run_id = Uuid::new_v4();
        let other_run = Uuid::new_v4();
        let h1 = dispatcher.submit(spec(run_id, "a")).unwrap();
        let h2 = dispatcher.submit(spec(run_id, "a")).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        dispatcher.cancel_run(run_id);

        assert!(h1.wait().await.unwrap_err().is_cancellation());
        assert!(h2.wait().await.unwrap_err().is_cancellation());
        // Unrelated runs are untouched by the cascade.
        dispatcher.cancel_run(other_run);
    }

    #[tokio::test]
    async fn test_input_snapshot_resolved_from_store() {
        let (dispatcher, store) = {
            let role = from_fn(|input: RoleInput| async move {
                let doc = input
                    .context_entry("spec/doc")
                    .map(|e| e.content.clone())
                    .unwrap_or_default();
                Ok(DelegationResult::success(input.spec.id).with_deliverable("echo", doc))
            });
            dispatcher_with(DispatchConfig::default(), vec![("reader", role)])
        };

        store
            .put(
                EntryDraft::new("spec/doc", "spec", json!("requirements v1")),
                "analyst",
            )
            .unwrap();

        let task = spec(Uuid::new_v4(), "reader")
            .with_inputs(vec![cadence_common::ContextRef::latest("spec/doc")]);
        let result = dispatcher.submit(task).unwrap().wait().await.unwrap();

        assert_eq!(result.deliverables["echo"], json!("requirements v1"));
    }
}
