//! Error types for the download module.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::parser::WorkshopId;

/// Why one attempt to fetch an item failed.
///
/// Every variant is retryable from the orchestrator's point of view; the
/// `Display` text becomes the outcome's `last_error`.
#[derive(Debug, Error)]
pub enum FetchItemError {
    /// The download tool ran but reported failure.
    #[error("download of item {id} failed: {reason}")]
    ToolFailed {
        /// Item id.
        id: WorkshopId,
        /// Reason reported by the tool (last meaningful output line).
        reason: String,
    },

    /// The download tool could not be launched.
    #[error("could not launch {program}: {source}")]
    Spawn {
        /// Program path.
        program: PathBuf,
        /// Launch error.
        #[source]
        source: std::io::Error,
    },

    /// The attempt exceeded the per-attempt time limit.
    #[error("timeout downloading item {id} after {limit:?}")]
    Timeout {
        /// Item id.
        id: WorkshopId,
        /// Limit that was exceeded.
        limit: Duration,
    },

    /// File system error while staging or placing content.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Tool reported success but left no content behind.
    #[error("item {id} reported as downloaded but {path} does not exist")]
    MissingContent {
        /// Item id.
        id: WorkshopId,
        /// Expected content location.
        path: PathBuf,
    },
}

impl FetchItemError {
    /// Creates a tool failure.
    pub fn failed(id: &WorkshopId, reason: impl Into<String>) -> Self {
        Self::ToolFailed {
            id: id.clone(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A run-level precondition failed; nothing was downloaded.
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// Destination directory could not be created.
    #[error("cannot create destination directory {path}: {source}")]
    CreateDir {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Destination exists but is not a directory.
    #[error("destination {path} exists and is not a directory")]
    NotADirectory {
        /// Destination path.
        path: PathBuf,
    },

    /// Destination directory rejected a probe write.
    #[error("destination directory {path} is not writable: {source}")]
    NotWritable {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The external download tool could not be located.
    #[error(
        "steamcmd not found (searched: {searched})\n  Suggestion: install steamcmd, pass --steamcmd PATH, or set STEAMCMD_DIR"
    )]
    ToolNotFound {
        /// Human-readable list of searched locations.
        searched: String,
    },

    /// No game app id was configured or detected.
    #[error(
        "could not determine the game's Steam app id\n  Suggestion: pass --app-id (e.g. 108600 for Project Zomboid)"
    )]
    MissingAppId,
}

/// Invalid orchestrator construction.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Concurrency outside the supported range.
    #[error("invalid concurrency value {value}: must be between {min} and {max}")]
    InvalidConcurrency {
        /// The value provided.
        value: usize,
        /// Minimum allowed.
        min: usize,
        /// Maximum allowed.
        max: usize,
    },
}
