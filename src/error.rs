//! Error types for mise-action
//!
//! All modules use `ActionResult<T>` as their return type. No stage recovers
//! from an error; everything bubbles up to `main`, which reports it once.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mise-action operations
pub type ActionResult<T> = Result<T, ActionError>;

/// All errors that can occur while running the action
#[derive(Error, Debug)]
pub enum ActionError {
    // Input errors
    #[error("Input does not meet YAML 1.2 \"Core Schema\" specification: {name}. Support boolean input list: `true | True | TRUE | false | False | FALSE`")]
    InvalidBooleanInput { name: String },

    // Download errors
    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to download {url}: HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {code}: {stderr}")]
    CommandExit {
        command: String,
        code: i32,
        stderr: String,
    },

    // Environment dump errors
    #[error("Invalid environment dump from mise: {0}")]
    EnvDump(String),

    // Cache errors
    #[error("Cache service is not available: {0}")]
    CacheUnavailable(String),

    #[error("Cache service error: {0}")]
    CacheService(String),

    #[error("Cache folder path does not exist on disk: {0}")]
    CachePathMissing(PathBuf),

    #[error("Invalid glob pattern {pattern}: {reason}")]
    GlobPattern { pattern: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Runner errors
    #[error("Failed to write workflow command file {path}: {source}")]
    FileCommand {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error (the process could not be spawned)
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command exit error from a non-zero exit code
    pub fn command_exit(command: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::CommandExit {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidBooleanInput { .. } => Some("Use `true` or `false`"),
            Self::CacheUnavailable(_) => {
                Some("Set `cache: false`, or pass --cache-dir to use a local cache directory")
            }
            Self::DownloadStatus { status: 404, .. } => {
                Some("Check that the requested mise version exists for this platform")
            }
            _ => None,
        }
    }
}

impl From<ureq::Error> for ActionError {
    fn from(err: ureq::Error) -> Self {
        Self::CacheService(err.to_string())
    }
}
