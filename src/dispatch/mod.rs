//! Delegation dispatch: routing tasks to named roles under per-role
//! concurrency limits, with retries, cooperative cancellation, and a full
//! audit trail in the context store's `progress` domain.

mod dispatcher;
mod role;

pub use dispatcher::{DelegationHandle, DispatchConfig, Dispatcher};
pub use role::{from_fn, Role, RoleInput, RoleRegistry};
