//! Local proxy control for musync.
//!
//! The agent never talks to the proxy process directly; it goes through
//! [`ProxyController`]. Two implementations ship here:
//!
//! - [`ManagedProxy`] keeps the configured users in memory, writes them to
//!   a JSON user list, restarts the proxy with a configured command and
//!   reads live counters from a JSON stats endpoint.
//! - [`MemoryProxy`] is fully in-memory with injectable counters and
//!   failures, for tests and dry runs.

mod error;
mod file;
mod managed;
mod memory;
mod traits;

pub use error::ProxyError;
pub use managed::ManagedProxy;
pub use memory::{MemoryProxy, ProxyOp};
pub use traits::ProxyController;
