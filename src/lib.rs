//! Cadence: a multi-phase task-orchestration engine.
//!
//! A controller drives a fixed five-phase run (specification, pseudocode,
//! architecture, refinement, completion), delegating work to named roles
//! through a concurrency-limited dispatcher, persisting every result to an
//! append-only versioned context store, and advancing phases only through
//! checkpointed gates. Gate failures loop through bounded remediation
//! cycles instead of failing the run.

pub mod blueprint;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod errors;
pub mod gate;
pub mod phase;
pub mod store;

// Re-export the shared domain types under one roof.
pub use cadence_common as common;
