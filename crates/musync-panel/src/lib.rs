//! Remote panel client for musync.
//!
//! The panel is the control plane: it declares which users this node
//! should serve and receives traffic, online-count, load and quality
//! reports. The agent only talks to it through [`PanelClient`].
//!
//! # Example
//!
//! ```no_run
//! use musync_panel::{HttpPanel, IdentityField, PanelClient};
//!
//! # async fn example() -> Result<(), musync_panel::PanelError> {
//! let panel = HttpPanel::new("https://panel.example.com", "mu-key", 7)
//!     .identity_field(IdentityField::Email);
//! let node = panel.fetch_node_info().await?;
//! let users = panel.fetch_declared_users(&node).await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod http;
mod memory;
mod traits;

pub use error::PanelError;
pub use http::{HttpPanel, IdentityField};
pub use memory::{MemoryPanel, PanelReport};
pub use traits::PanelClient;
