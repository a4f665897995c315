//! Error types for sacrun.
//!
//! Every failure here aborts before delegation; the only error produced after
//! the child process starts is its own nonzero exit, surfaced verbatim as
//! [`LaunchError::Delegate`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for sacrun.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Failed to resolve launcher location: {0}")]
    PathResolution(#[source] std::io::Error),

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to snapshot config into {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn entrypoint '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Entrypoint exited with code {code}")]
    Delegate { code: i32 },

    #[error("Entrypoint was terminated by a signal")]
    Interrupted,
}

impl LaunchError {
    /// Create a path-resolution error from a plain message.
    pub fn path_resolution(message: impl Into<String>) -> Self {
        Self::PathResolution(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            message.into(),
        ))
    }

    /// Process exit code to report for this error.
    ///
    /// A delegate failure propagates the child's code unchanged; every local
    /// failure exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Delegate { code } => *code,
            _ => 1,
        }
    }
}

/// Result type alias for sacrun.
pub type Result<T> = std::result::Result<T, LaunchError>;
