//! Uploaded documents and their controlled vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ApplicationId, DocumentId, DocumentTypeId, StudentId};

/// A file uploaded by a student.
///
/// Owned by the student; applications only reference it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub student_id: StudentId,
    #[serde(default)]
    pub doc_type_id: Option<DocumentTypeId>,
    pub file_name: String,
    /// Public storage locator.
    pub file_url: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_verified: bool,
    /// The application that originally requested this document, if any.
    #[serde(default)]
    pub application_id: Option<ApplicationId>,
}

/// Controlled vocabulary entry used to classify documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: DocumentTypeId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A document joined with its type, as the dashboards load it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub document: Document,
    pub doc_type: Option<DocumentType>,
}

impl DocumentEntry {
    pub fn new(document: Document, doc_type: Option<DocumentType>) -> Self {
        Self { document, doc_type }
    }

    pub fn id(&self) -> &DocumentId {
        &self.document.id
    }

    /// The joined type name, if the document has a type.
    pub fn type_name(&self) -> Option<&str> {
        self.doc_type.as_ref().map(|ty| ty.name.as_str())
    }
}
