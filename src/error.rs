//! Custom error types for backrest-setup
//!
//! This module defines the error hierarchy for the installer using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for backrest-setup operations
#[derive(Error, Debug)]
pub enum SetupError {
    /// Some but not all of the remote storage flags were given
    #[error("Incomplete remote configuration: missing {}", .missing.join(", "))]
    IncompleteRemoteConfig { missing: Vec<&'static str> },

    /// Remote type other than cifs or webdav
    #[error("Unsupported remote type: {0} (expected cifs or webdav)")]
    UnsupportedRemoteType(String),

    /// CPU architecture without a matching release asset
    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed with exit code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// HTTP errors talking to the release API
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Release metadata or archive problems
    #[error("Release error: {0}")]
    Release(String),
}

impl SetupError {
    /// Create an I/O error with context about what was being done
    pub fn io(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", context, err))
    }

    /// Process exit code for this error
    ///
    /// A failed external command propagates its own exit code; everything
    /// else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// Check if this error was raised before anything on the host was changed
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::IncompleteRemoteConfig { .. }
                | Self::UnsupportedRemoteType(_)
                | Self::UnsupportedArchitecture(_)
        )
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for SetupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SetupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<reqwest::Error> for SetupError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Result type alias for backrest-setup operations
pub type SetupResult<T> = Result<T, SetupError>;
