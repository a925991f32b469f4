//! Core types and constants shared across musync crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Task and failure labels for metrics/logging
//! - The user, traffic and node data model exchanged between the panel,
//!   the local proxy and the sync engine

pub mod defaults;
pub mod labels;
pub mod node;
pub mod traffic;
pub mod user;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use labels::*;
pub use node::{HostLoad, NodeInfo, QualityReport, QualitySample};
pub use traffic::{Counters, TrafficDelta};
pub use user::{Credential, UserId, UserRecord, UserSet};

/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
