//! The multiplexer as seen by the broadcast engine.
//!
//! Everything the engine reads or writes goes through [`Host`], keyed by
//! [`PaneId`]. Adapters exist per multiplexer; see [`crate::tmux::TmuxHost`].

use crate::error::HostError;
use crate::types::{Choice, PaneId, Tab};

/// Completion for a line prompt. Called at most once, never if cancelled.
pub type LineDone<'a> = Box<dyn FnOnce(String) + 'a>;

/// Completion for a choice prompt, receives the selected [`Choice::id`].
pub type ChoiceDone<'a> = Box<dyn FnOnce(String) + 'a>;

pub trait Host {
    /// Tabs of the active window, in host order.
    fn tabs(&self) -> Result<Vec<Tab>, HostError>;

    /// The currently active tab, if any.
    fn active_tab(&self) -> Result<Option<Tab>, HostError>;

    fn title(&self, pane: PaneId) -> Option<String>;

    /// Name of the pane's foreground process.
    fn process_name(&self, pane: PaneId) -> Option<String>;

    /// Argument list of the pane's foreground process. Allowed to fail
    /// transiently (process exited, permission denied).
    fn process_argv(&self, pane: PaneId) -> Result<Vec<String>, HostError>;

    /// Write `text` to the pane verbatim.
    fn send_text(&self, pane: PaneId, text: &str) -> Result<(), HostError>;

    /// Perform the host's key action for `key` with `mods` (`"CTRL|SHIFT"`).
    fn send_key(&self, pane: PaneId, key: &str, mods: &str) -> Result<(), HostError>;

    /// Ask the user for a line of input on behalf of `pane`.
    fn prompt_line<'a>(&'a self, pane: PaneId, description: &str, done: LineDone<'a>) {
        let _ = (pane, description, done);
    }

    /// Ask the user to pick one of `choices`.
    fn choose<'a>(&'a self, pane: PaneId, title: &str, choices: &[Choice], done: ChoiceDone<'a>) {
        let _ = (pane, title, choices, done);
    }
}
