//! # musync
//!
//! Keeps a local proxy's active users and traffic accounting in sync with
//! a remote panel.
//!
//! ## Crates
//!
//! - [`musync_core`] - Shared data model and default settings
//! - [`musync_config`] - Configuration loading and validation
//! - [`musync_metrics`] - Prometheus-compatible metrics
//! - [`musync_panel`] - Remote panel client
//! - [`musync_proxy`] - Local proxy control
//! - [`musync_probe`] - Host load and bandwidth-quality probes
//! - [`musync_agent`] - Reconciliation, traffic accounting and scheduling

pub use musync_agent as agent;
pub use musync_config as config;
pub use musync_core as core;
pub use musync_metrics as metrics;
pub use musync_panel as panel;
pub use musync_probe as probe;
pub use musync_proxy as proxy;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use musync_agent::{
        Agent, Collaborators, ReconciliationEngine, Schedule, SyncError, TrafficAccountant,
    };
    pub use musync_config::{AgentConfig, load_config, validate_config};
    pub use musync_core::{Counters, NodeInfo, UserId, UserRecord, UserSet};
    pub use musync_panel::{HttpPanel, MemoryPanel, PanelClient};
    pub use musync_proxy::{ManagedProxy, MemoryProxy, ProxyController};
}
