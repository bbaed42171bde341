//! Gateway error types.
//!
//! Backend failures carry the store's message verbatim so that callers can
//! pass it straight through to the user.

use std::path::PathBuf;

use admit_model::{ErrorKind, Notification};
use thiserror::Error;

use crate::table::{Operation, Table};

/// Persistence gateway or object store error.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The store rejected or failed an operation.
    #[error("{message}")]
    Backend {
        operation: Operation,
        table: Table,
        message: String,
    },

    /// A row could not be decoded into the expected shape.
    #[error("Malformed {table} row: {source}")]
    Decode {
        table: Table,
        #[source]
        source: serde_json::Error,
    },

    /// The object store failed.
    #[error("{message}")]
    Storage {
        operation: &'static str,
        bucket: String,
        path: String,
        message: String,
    },

    /// Snapshot file I/O error.
    #[error("Failed to {operation} snapshot file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file is not valid JSON of the expected shape.
    #[error("Invalid snapshot file: {path}")]
    InvalidSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("Failed to complete snapshot save")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GatewayError {
    pub fn backend(operation: Operation, table: Table, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            table,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Backend
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Backend { .. } | Self::Decode { .. } => "Server error",
            Self::Storage { .. } => "Upload failed",
            Self::Io { .. } | Self::InvalidSnapshot { .. } | Self::AtomicWriteFailed { .. } => {
                "Store file error"
            }
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message, .. } | Self::Storage { message, .. } => message.clone(),
            Self::Decode { table, .. } => {
                format!("The {table} data returned by the server could not be read.")
            }
            Self::Io {
                operation, path, ..
            } => format!("Could not {} the file at {}", operation, path.display()),
            Self::InvalidSnapshot { path, .. } => {
                format!("The file at {} is not a valid store snapshot.", path.display())
            }
            Self::AtomicWriteFailed { target_path, .. } => format!(
                "Could not save the file to {}. Please check disk space and permissions.",
                target_path.display()
            ),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Backend { .. } | Self::Storage { .. } => {
                Some("Check your connection and try again.".into())
            }
            Self::Decode { .. } => None,
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::InvalidSnapshot { .. } => {
                Some("Make sure you selected a snapshot written by this tool.".into())
            }
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
        }
    }

    pub fn notification(&self) -> Notification {
        Notification::new(self.kind(), self.title(), self.user_message())
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
