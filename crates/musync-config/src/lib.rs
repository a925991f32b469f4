//! Configuration loading, CLI overrides and validation.
//!
//! The agent reads one file (TOML, YAML or JSON with comments, chosen by
//! extension), applies command-line overrides on top and validates the
//! result before anything is started.

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::*;
pub use validate::validate_config;
