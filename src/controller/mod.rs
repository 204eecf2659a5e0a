//! The orchestrator controller: the top-level driver that decomposes a run
//! into phase plans, issues delegations, persists boomerang results,
//! invokes the gate validator at phase boundaries, and handles remediation
//! cycles on gate failure.

mod engine;
mod runner;

pub use engine::{DelegationView, Engine, RunView};
pub use runner::{run_key, RunController, RunTrace};
