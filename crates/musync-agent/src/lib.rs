//! musync agent.
//!
//! Keeps a local proxy's users and traffic accounting in sync with a
//! remote panel. One [`Agent`] owns the collaborators and drives four
//! periodic tasks:
//!
//! - reconciliation ([`ReconciliationEngine`]): diff declared users against
//!   the proxy's active set, apply the difference, reload when dirty
//! - traffic accounting ([`TrafficAccountant`]): report per-user deltas
//!   against a [`TrafficLedger`] baseline and the online count
//! - load reporting ([`LoadReporter`])
//! - quality reporting ([`QualityReporter`])

pub mod accountant;
pub mod agent;
pub mod cli;
pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod reporters;
pub mod scheduler;

pub use accountant::{AccountReport, TrafficAccountant, TrafficOutcome};
pub use agent::{Agent, Collaborators, Schedule};
pub use cli::{CheckArgs, RunArgs};
pub use error::SyncError;
pub use ledger::TrafficLedger;
pub use reconcile::{
    Action, ActionKind, AppliedAction, ApplyOutcome, ReconcilePlan, ReconcileReport,
    ReconciliationEngine, ReloadOutcome, SyncState, plan,
};
pub use reporters::{LoadReporter, QualityReporter};
pub use scheduler::{PeriodicTask, spawn_periodic};
