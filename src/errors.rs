// src/errors.rs

//! Crate-wide error types.
//!
//! [`LoadError`] is what a load session fails with; it is cheap to clone so it
//! can travel inside [`SessionEvent::FatalError`](crate::engine::SessionEvent).
//! [`LoadgateError`] wraps it together with the I/O and parsing failures of
//! the glue around the core.

use thiserror::Error;

use crate::dag::diagnose::StallReport;
use crate::types::UnitId;

/// Why a load session ended in the `Failed` state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Malformed or duplicate unit descriptor, detected before any dispatch.
    #[error("validation error: {0}")]
    Validation(String),

    /// Nothing is eligible, nothing is in flight, and units remain.
    #[error("not all units could be loaded: {0}")]
    CycleOrMissingDependency(StallReport),

    /// A fetch backend reported that a dispatched unit could not be retrieved.
    #[error("unit '{id}' could not be loaded: {reason}")]
    Fetch { id: UnitId, reason: String },

    /// A completion was reported for an unknown or already-completed unit.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The session was cancelled before every unit finished.
    #[error("load session cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum LoadgateError {
    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("runtime event channel closed with {0} unit(s) still in flight")]
    ChannelClosed(usize),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoadgateError {
    /// The session-level error, if this is one.
    pub fn as_load_error(&self) -> Option<&LoadError> {
        match self {
            LoadgateError::Load(err) => Some(err),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LoadgateError>;
