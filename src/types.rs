use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::error::ConfigError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stable identity of one pane as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneId(pub u64);

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Snapshot of one tab (tmux: window) as returned by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tab {
    pub id: u64,
    /// Panes in host enumeration order.
    pub panes: Vec<PaneId>,
    pub active_pane: Option<PaneId>,
}

/// Matchable view of a pane. Every field is lowercase and never absent.
/// Built fresh on every dispatch, the foreground process changes over time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub title: String,
    pub process: String,
    /// Foreground process arguments joined by single spaces.
    pub argv: String,
}

impl Context {
    pub fn field(&self, field: MatchField) -> &str {
        match field {
            MatchField::Title => &self.title,
            MatchField::Process => &self.process,
            MatchField::Argv => &self.argv,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.process.is_empty() && self.argv.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField { Title, Process, Argv }

pub const DEFAULT_MATCH_FIELDS: [MatchField; 3] = [MatchField::Title, MatchField::Process, MatchField::Argv];

/// Which tabs the collector walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    ActiveTab,
    AllTabs,
}

/// Which panes of each walked tab the collector takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabMode {
    #[default]
    AllPanes,
    ActivePane,
}

/// How submit keys reach a pane: through the host's key action, or written
/// as raw text when the key has a textual encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendKeyMode {
    #[default]
    Window,
    Text,
}

fn invalid(kind: &str, value: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid(format!("unknown {kind} '{value}' (expected {expected})"))
}

impl FromStr for Scope {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "active_tab" => Ok(Scope::ActiveTab),
            "all_tabs" => Ok(Scope::AllTabs),
            _ => Err(invalid("scope", s, "active_tab or all_tabs")),
        }
    }
}

impl FromStr for TabMode {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "all_panes" => Ok(TabMode::AllPanes),
            "active_pane" => Ok(TabMode::ActivePane),
            _ => Err(invalid("tab mode", s, "all_panes or active_pane")),
        }
    }
}

impl FromStr for SendKeyMode {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "window" => Ok(SendKeyMode::Window),
            "text" => Ok(SendKeyMode::Text),
            _ => Err(invalid("send key mode", s, "window or text")),
        }
    }
}

/// One key press: a key name plus a `|`-delimited modifier list such as
/// `"CTRL|SHIFT"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub key: String,
    #[serde(default)]
    pub mods: String,
}

impl KeyDescriptor {
    pub fn new(key: impl Into<String>, mods: impl Into<String>) -> Self {
        Self { key: key.into(), mods: mods.into() }
    }

    pub fn enter() -> Self {
        Self::new("Enter", "")
    }
}

/// An entry in a host choice prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}
