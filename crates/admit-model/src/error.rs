//! Error taxonomy shared by the admissions crates.
//!
//! Every crate keeps its own error enum, but each one classifies itself into
//! an [`ErrorKind`] and renders a [`Notification`] for the dashboards.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A caller-correctable precondition was not met.
    Validation,
    /// The actor may not perform the operation.
    Authorization,
    /// The store or object store failed. Message passed through verbatim.
    Backend,
    /// A secondary effect failed. Logged, never blocking.
    BestEffort,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Backend => "backend",
            ErrorKind::BestEffort => "best_effort",
        }
    }

    /// Whether the primary operation was blocked.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, ErrorKind::BestEffort)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single human-readable notification: a title and a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: ErrorKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(kind: ErrorKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Errors raised while building model values or loading configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid {kind} id: '{value}'")]
    InvalidId { kind: &'static str, value: String },

    #[error("Failed to read configuration file: {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigJson(#[source] serde_json::Error),

    /// A configuration value is out of range.
    #[error("Invalid configuration value for {field}: {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId { .. } | Self::InvalidConfig { .. } => ErrorKind::Validation,
            Self::ConfigIo { .. } | Self::ConfigParse { .. } | Self::ConfigJson(_) => {
                ErrorKind::Backend
            }
        }
    }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
