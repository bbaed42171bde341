//! Reference rows the core reads but never owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ApplicationId, BankAccountId, OfferLetterId, ProgramId, StudentId, UniversityId};

/// A study program offered by a university.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub university_id: UniversityId,
    pub name: String,
}

/// An offer letter uploaded by the university for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferLetter {
    pub id: OfferLetterId,
    pub application_id: ApplicationId,
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// University bank details, shown to a student once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub university_id: UniversityId,
    pub bank_name: String,
    pub account_holder: String,
    pub iban: String,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Student contact profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub email: String,
}
