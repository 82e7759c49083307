//! Broadcast text and submit keys to the panes of a terminal multiplexer,
//! choosing per pane which target (and so which submit action) applies.

pub mod cli;
pub mod collector;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod host;
pub mod keys;
pub mod matcher;
pub mod submit;
pub mod target;
pub mod tmux;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use engine::{Engine, Match, PromptOptions};
pub use error::{CapabilityError, ConfigError, Error, HostError};
pub use host::Host;
pub use target::{Target, TargetConfig};
pub use tmux::TmuxHost;
pub use types::{KeyDescriptor, PaneId, Scope, SendKeyMode, Tab, TabMode};
