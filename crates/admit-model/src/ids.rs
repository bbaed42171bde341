//! Opaque row identifiers.
//!
//! Identifiers come from the store as strings. They are never interpreted,
//! only compared, so each one is a thin newtype to keep them from being mixed
//! up at call sites.

use std::fmt;

use crate::ModelError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier as returned by the store.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parse user input, rejecting blank identifiers.
            pub fn parse(value: &str) -> Result<Self, ModelError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::InvalidId {
                        kind: $kind,
                        value: value.to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Identifier of an application row.
    ApplicationId,
    "application"
);
string_id!(
    /// Identifier of a student profile.
    StudentId,
    "student"
);
string_id!(
    /// Identifier of an uploaded document.
    DocumentId,
    "document"
);
string_id!(DocumentTypeId, "document type");
string_id!(ProgramId, "program");
string_id!(UniversityId, "university");
string_id!(OfferLetterId, "offer letter");
string_id!(BankAccountId, "bank account");
