//! Document error types.

use admit_model::{ApplicationId, DocumentId, ErrorKind, Notification, Role};
use admit_store::GatewayError;
use thiserror::Error;

/// Errors raised by document operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("Application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// The document is not one of the application student's documents.
    #[error("Document {0} is not in the student's library")]
    NotInLibrary(DocumentId),

    #[error("A {role} may not {action}")]
    NotPermitted { role: Role, action: &'static str },

    /// The selection ledger was closed.
    #[error("Document selection for application {0} is closed")]
    LedgerClosed(ApplicationId),

    /// The store failed; its message is passed through.
    #[error(transparent)]
    Backend(#[from] GatewayError),
}

impl DocumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ApplicationNotFound(_)
            | Self::DocumentNotFound(_)
            | Self::NotInLibrary(_)
            | Self::LedgerClosed(_) => ErrorKind::Validation,
            Self::NotPermitted { .. } => ErrorKind::Authorization,
            Self::Backend(_) => ErrorKind::Backend,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ApplicationNotFound(_) | Self::DocumentNotFound(_) => "Not found",
            Self::NotPermitted { .. } => "Not allowed",
            Self::NotInLibrary(_) => "Document unavailable",
            Self::LedgerClosed(_) => "Selection closed",
            Self::Backend(_) => "Something went wrong",
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApplicationNotFound(_) => "This application no longer exists.".to_string(),
            Self::DocumentNotFound(_) => "This document no longer exists.".to_string(),
            Self::NotInLibrary(_) => {
                "Only your own uploaded documents can be shared with an application.".to_string()
            }
            Self::NotPermitted { action, .. } => {
                format!("You do not have permission to {action}.")
            }
            Self::LedgerClosed(_) => {
                "The document selection was closed. Open the application again.".to_string()
            }
            Self::Backend(e) => e.user_message(),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::DocumentNotFound(_) | Self::NotInLibrary(_) => {
                Some("Refresh your documents list.".into())
            }
            Self::Backend(e) => e.suggestion(),
            _ => None,
        }
    }

    pub fn notification(&self) -> Notification {
        Notification::new(self.kind(), self.title(), self.user_message())
    }
}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;
