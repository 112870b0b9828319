//! Error types for smartwatch.
//!
//! The diff engine is infallible. Everything that touches the outside world
//! (running smartctl, parsing its tables, reading and writing JSON files,
//! loading config, prompting) reports failures through [`Error`].

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The device scan could not be run or produced unusable output.
    #[error("device enumeration failed: {0}")]
    DeviceEnumerationFailed(String),

    /// A device's attribute table did not match the expected fixed-width layout.
    #[error("failed to parse attributes for {device}: {reason}")]
    AttributeParseFailed { device: String, reason: String },

    /// A stored snapshot (or history) file exists but could not be read or decoded.
    #[error("failed to load snapshot from {}: {reason}", .path.display())]
    SnapshotLoadFailed { path: PathBuf, reason: String },

    #[error("failed to save snapshot to {}: {reason}", .path.display())]
    SnapshotSaveFailed { path: PathBuf, reason: String },

    #[error("invalid config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// The external scanning tool is not installed or not on PATH.
    #[error("{0} not found (install smartmontools or set smartctl.binary in config)")]
    ToolUnavailable(String),

    #[error("could not determine data directory")]
    NoDataDir,

    #[error("failed to read confirmation: {0}")]
    Prompt(#[source] std::io::Error),
}

impl Error {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::SnapshotLoadFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn save(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::SnapshotSaveFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
