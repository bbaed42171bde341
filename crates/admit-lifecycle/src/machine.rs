//! Application state machine.
//!
//! | From                      | Action   | Next         |
//! |---------------------------|----------|--------------|
//! | draft                     | submit   | submitted    |
//! | submitted / under_review  | accept   | accepted     |
//! | submitted / under_review  | reject   | rejected     |
//! | draft / submitted / under_review | withdraw | (deleted) |
//!
//! Who may perform an action is decided by [`authorize`]; whether the
//! application's current status allows it by [`next_status`]. Callers check
//! both before touching the store.

use std::fmt;

use admit_model::{Actor, Application, ApplicationStatus, UniversityId};

use crate::error::{LifecycleError, Result};

/// Something an actor wants to do to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Start a new draft.
    Create,
    /// Edit the data of a draft.
    EditDraft,
    Submit,
    Accept,
    Reject,
    Withdraw,
    /// Administrator sets a status directly.
    Override(ApplicationStatus),
    UploadOfferLetter,
    ViewBankAccounts,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::EditDraft => "edit",
            Action::Submit => "submit",
            Action::Accept => "accept",
            Action::Reject => "reject",
            Action::Withdraw => "withdraw",
            Action::Override(_) => "change the status of",
            Action::UploadOfferLetter => "upload an offer letter for",
            Action::ViewBankAccounts => "view bank accounts for",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an authorization decision is made against.
#[derive(Debug, Clone, Copy)]
pub struct AccessTarget<'a> {
    pub application: &'a Application,
    /// University owning the application's program, when known.
    pub university_id: Option<&'a UniversityId>,
}

impl<'a> AccessTarget<'a> {
    pub fn new(application: &'a Application, university_id: Option<&'a UniversityId>) -> Self {
        Self {
            application,
            university_id,
        }
    }
}

/// The single permission check for every application action.
///
/// - students act on their own applications only
/// - university officials act on applications to their university's programs
/// - administrators may do anything
pub fn authorize(actor: &Actor, action: Action, target: AccessTarget<'_>) -> Result<()> {
    let denied = |reason: &'static str| {
        Err(LifecycleError::NotPermitted {
            role: actor.role(),
            action,
            application_id: target.application.id.clone(),
            reason,
        })
    };

    match actor {
        Actor::Administrator => Ok(()),
        Actor::Student { student_id } => match action {
            Action::Create
            | Action::EditDraft
            | Action::Submit
            | Action::Withdraw
            | Action::ViewBankAccounts => {
                if *student_id == target.application.student_id {
                    Ok(())
                } else {
                    denied("the application belongs to another student")
                }
            }
            _ => denied("students cannot perform this action"),
        },
        Actor::UniversityOfficial { university_id } => match action {
            Action::Accept
            | Action::Reject
            | Action::UploadOfferLetter
            | Action::ViewBankAccounts => {
                if target.university_id == Some(university_id) {
                    Ok(())
                } else {
                    denied("the program belongs to another university")
                }
            }
            _ => denied("university officials cannot perform this action"),
        },
    }
}

/// Status after `action`, or `None` when the application is deleted.
///
/// Fails with [`LifecycleError::InvalidTransition`] when `current` does not
/// allow the action.
pub fn next_status(action: Action, current: ApplicationStatus) -> Result<Option<ApplicationStatus>> {
    use ApplicationStatus::{Accepted, Draft, Rejected, Submitted, UnderReview};

    let invalid = || {
        Err(LifecycleError::InvalidTransition {
            action,
            status: current,
        })
    };

    match (action, current) {
        (Action::Submit, Draft) => Ok(Some(Submitted)),
        (Action::Accept, Submitted | UnderReview) => Ok(Some(Accepted)),
        (Action::Reject, Submitted | UnderReview) => Ok(Some(Rejected)),
        (Action::Withdraw, Draft | Submitted | UnderReview) => Ok(None),
        (Action::Override(next), _) => Ok(Some(next)),
        (Action::EditDraft, Draft) => Ok(Some(Draft)),
        (Action::UploadOfferLetter, Submitted | UnderReview | Accepted) => Ok(Some(current)),
        (Action::Create | Action::ViewBankAccounts, _) => Ok(Some(current)),
        _ => invalid(),
    }
}

/// Display progress in percent.
pub fn progress(status: ApplicationStatus) -> u8 {
    status.progress()
}
