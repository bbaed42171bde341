//! Lifecycle error types.
//!
//! Primary operations fail loudly with one of these. Each error knows its
//! [`ErrorKind`] and renders the notification shown to the user.

use admit_model::{
    ApplicationId, ApplicationStatus, ErrorKind, MAX_PAYMENT_WINDOW_DAYS, Notification, ProgramId,
    Role,
};
use admit_store::GatewayError;
use thiserror::Error;

use crate::machine::Action;

/// Application lifecycle error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LifecycleError {
    #[error("Application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    #[error("Program not found: {0}")]
    ProgramNotFound(ProgramId),

    /// Acceptance needs an offer letter on file.
    #[error("Application {application_id} has no offer letter")]
    MissingOfferLetter { application_id: ApplicationId },

    /// The configured payment window cannot produce a due date.
    #[error("Payment window of {days} days is out of range")]
    InvalidPaymentWindow { days: i64 },

    /// The current status does not allow the action.
    #[error("Cannot {action} an application that is {status}")]
    InvalidTransition {
        action: Action,
        status: ApplicationStatus,
    },

    /// A draft edit tried to write keys only the core maintains.
    #[error("Draft edits may not set {}", .fields.join(", "))]
    ReservedFields { fields: Vec<&'static str> },

    /// The actor's role does not allow the action.
    #[error("A {role} may not {action} application {application_id}: {reason}")]
    NotPermitted {
        role: Role,
        action: Action,
        application_id: ApplicationId,
        reason: &'static str,
    },

    /// Only a student can perform the action.
    #[error("Only students can {action} applications")]
    StudentOnly { action: Action },

    /// The store failed; its message is passed through.
    #[error(transparent)]
    Backend(#[from] GatewayError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ApplicationNotFound(_)
            | Self::ProgramNotFound(_)
            | Self::MissingOfferLetter { .. }
            | Self::InvalidTransition { .. }
            | Self::ReservedFields { .. }
            | Self::InvalidPaymentWindow { .. } => ErrorKind::Validation,
            Self::NotPermitted { .. } | Self::StudentOnly { .. } => ErrorKind::Authorization,
            Self::Backend(_) => ErrorKind::Backend,
        }
    }

    /// Short title for the notification.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ApplicationNotFound(_) | Self::ProgramNotFound(_) => "Not found",
            Self::MissingOfferLetter { .. } => "Offer letter required",
            Self::InvalidTransition { .. } => "Action not available",
            Self::ReservedFields { .. } => "Field not editable",
            Self::InvalidPaymentWindow { .. } => "Configuration error",
            Self::NotPermitted { .. } | Self::StudentOnly { .. } => "Not allowed",
            Self::Backend(_) => "Something went wrong",
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApplicationNotFound(_) => {
                "This application no longer exists. It may have been withdrawn.".to_string()
            }
            Self::ProgramNotFound(_) => "The selected program could not be found.".to_string(),
            Self::MissingOfferLetter { .. } => {
                "Please upload an offer letter first, then accept the application.".to_string()
            }
            Self::InvalidTransition { action, status } => {
                format!("You cannot {action} an application that is {status}.")
            }
            Self::InvalidPaymentWindow { days } => {
                format!("A payment window of {days} days cannot be opened.")
            }
            Self::ReservedFields { fields } => format!(
                "{} cannot be changed from the application form.",
                fields.join(", ")
            ),
            Self::NotPermitted { action, .. } => {
                format!("You do not have permission to {action} this application.")
            }
            Self::StudentOnly { action } => format!("Only students can {action} applications."),
            Self::Backend(e) => e.user_message(),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingOfferLetter { .. } => {
                Some("Use \"Upload offer letter\" on the application page.".into())
            }
            Self::ApplicationNotFound(_) => Some("Refresh the list of applications.".into()),
            Self::InvalidPaymentWindow { .. } => {
                Some(format!(
                    "Set payment_window_days between 1 and {MAX_PAYMENT_WINDOW_DAYS}."
                ))
            }
            Self::ReservedFields { .. } => {
                Some("Share documents from the document selection instead.".into())
            }
            Self::Backend(e) => e.suggestion(),
            _ => None,
        }
    }

    pub fn notification(&self) -> Notification {
        Notification::new(self.kind(), self.title(), self.user_message())
    }
}

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use admit_store::{Operation, Table};

    #[test]
    fn test_missing_offer_letter_is_validation() {
        let err = LifecycleError::MissingOfferLetter {
            application_id: ApplicationId::new("a1"),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        insta::assert_snapshot!(
            err.notification().to_string(),
            @"Offer letter required: Please upload an offer letter first, then accept the application."
        );
    }

    #[test]
    fn test_backend_message_passes_through() {
        let err = LifecycleError::from(GatewayError::backend(
            Operation::Write,
            Table::Applications,
            "duplicate key value",
        ));
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.to_string(), "duplicate key value");
        assert_eq!(err.user_message(), "duplicate key value");
    }

    #[test]
    fn test_reserved_fields_notification() {
        let err = LifecycleError::ReservedFields {
            fields: vec!["payment_status"],
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        insta::assert_snapshot!(
            err.notification().to_string(),
            @"Field not editable: payment_status cannot be changed from the application form."
        );
    }

    #[test]
    fn test_not_permitted_is_authorization() {
        let err = LifecycleError::NotPermitted {
            role: Role::Student,
            action: Action::Accept,
            application_id: ApplicationId::new("a1"),
            reason: "students cannot perform this action",
        };
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(
            err.user_message(),
            "You do not have permission to accept this application."
        );
    }
}
