//! Type-safe enumerations for application status and viewer roles.
//!
//! The store keeps both as lowercase snake_case strings; these enums give
//! them compile-time exhaustiveness at every call site.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{StudentId, UniversityId};

/// Stored status of an application.
///
/// `Submitted` and `UnderReview` are distinct stored values but behave the
/// same for progress and visibility purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    /// Returns the value as stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Display progress in percent. Derived, never stored.
    pub fn progress(&self) -> u8 {
        match self {
            ApplicationStatus::Draft => 30,
            ApplicationStatus::Submitted | ApplicationStatus::UnderReview => 75,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => 100,
        }
    }

    /// Submitted or under review: waiting on a university decision.
    pub fn is_pending_decision(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Submitted | ApplicationStatus::UnderReview
        )
    }

    /// Accepted or rejected.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    /// Accepts the stored form and a few spellings seen in dashboards.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");

        match normalized.as_str() {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under_review" | "in_review" => Ok(ApplicationStatus::UnderReview),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(format!("Unknown application status: {s}")),
        }
    }
}

/// The role a viewer acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    UniversityOfficial,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::UniversityOfficial => "university_official",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "university_official" | "official" => Ok(Role::UniversityOfficial),
            "administrator" | "admin" => Ok(Role::Administrator),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

/// The authenticated principal performing an operation.
///
/// Supplied by the session layer; the core never derives it from a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Student { student_id: StudentId },
    UniversityOfficial { university_id: UniversityId },
    Administrator,
}

impl Actor {
    pub fn student(student_id: impl Into<String>) -> Self {
        Actor::Student {
            student_id: StudentId::new(student_id),
        }
    }

    pub fn official(university_id: impl Into<String>) -> Self {
        Actor::UniversityOfficial {
            university_id: UniversityId::new(university_id),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Actor::Student { .. } => Role::Student,
            Actor::UniversityOfficial { .. } => Role::UniversityOfficial,
            Actor::Administrator => Role::Administrator,
        }
    }

    /// The student id when acting as a student.
    pub fn student_id(&self) -> Option<&StudentId> {
        match self {
            Actor::Student { student_id } => Some(student_id),
            _ => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Student { student_id } => write!(f, "student:{student_id}"),
            Actor::UniversityOfficial { university_id } => write!(f, "official:{university_id}"),
            Actor::Administrator => f.write_str("admin"),
        }
    }
}

impl FromStr for Actor {
    type Err = String;

    /// Parses `student:<id>`, `official:<university id>` or `admin`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (role, id) = match s.split_once(':') {
            Some((role, id)) => (role, Some(id.trim())),
            None => (s, None),
        };

        match (role.parse::<Role>()?, id) {
            (Role::Administrator, _) => Ok(Actor::Administrator),
            (Role::Student, Some(id)) if !id.is_empty() => Ok(Actor::student(id)),
            (Role::UniversityOfficial, Some(id)) if !id.is_empty() => Ok(Actor::official(id)),
            _ => Err(format!("Actor '{s}' is missing an id (expected role:id)")),
        }
    }
}
