//! Error types shared by the host adapters, the configuration loader and the
//! pluggable capabilities.
//!
//! None of these ever escape a dispatch call: the engine logs and skips. They
//! surface only from configuration loading and the command-line front end.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::PaneId;

/// Failure reported by a [`Host`](crate::host::Host) implementation.
#[derive(Debug, Error)]
pub enum HostError {
    /// Spawning or talking to the multiplexer failed at the OS level.
    #[error("host i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The multiplexer ran but exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    /// The multiplexer binary could not be located.
    #[error("multiplexer binary not found: {0}")]
    NotFound(String),

    #[error("pane {0} not found")]
    PaneNotFound(PaneId),

    /// The host does not provide this capability on this platform.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// The host refused the request for any other reason.
    #[error("{0}")]
    Rejected(String),
}

/// Failure raised by a user-supplied predicate, matcher, collector, filter or
/// submit action.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CapabilityError {
    message: String,
}

impl CapabilityError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self { message: message.to_string() }
    }
}

impl From<HostError> for CapabilityError {
    fn from(e: HostError) -> Self {
        Self::new(e)
    }
}

/// Failure while loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in config '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level error of the command-line front end.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
