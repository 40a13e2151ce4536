//! The stake plugin facade.
//!
//! [`StakePlugin`] is the only surface callers use: it lists policies,
//! quotes actions and reads positions. [`PluginConfig`] carries everything
//! that varies between deployments (RPC endpoints, hidden policies, logging).

pub mod config;
pub mod plugin;

pub use config::{FantomConfig, PluginConfig};
pub use plugin::StakePlugin;
