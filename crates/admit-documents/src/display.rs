//! Human-readable labels for documents.
//!
//! Both the student's own documents view and the reviewer's shared documents
//! view label a document with [`resolve_document_display`]. The first rule
//! that applies wins:
//!
//! 1. The type name is a canonical key: use the canonical entry.
//! 2. The file name is exactly a canonical key (legacy rows uploaded without a
//!    type but named after one): use that entry.
//! 3. The type name is not canonical: use the type's own name and description.
//! 4. There is no type: use the "Additional Documents" entry.
//!
//! The file name is shown as the original name whenever it differs from what
//! the title was derived from, and always under rule 4.

use std::collections::HashMap;

use admit_model::{CanonicalTypeEntry, CoreConfig, DocumentEntry};
use serde::Serialize;

/// Key of the entry used for documents without a type.
pub const ADDITIONAL_DOCUMENTS: &str = "Additional Documents";

/// Key of the canonical payment receipt entry.
pub const PAYMENT_RECEIPT: &str = "Payment Receipt";

/// What the UI shows for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayDescriptor {
    pub title: String,
    pub description: Option<String>,
    /// The stored file name, when it is worth showing next to the title.
    pub original_file_name: Option<String>,
}

/// Read-only table of recognized document types, keyed by type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDocumentTypes {
    entries: HashMap<String, CanonicalTypeEntry>,
}

impl CanonicalDocumentTypes {
    pub fn new(entries: impl IntoIterator<Item = CanonicalTypeEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.key.clone(), entry))
                .collect(),
        }
    }

    /// The configured table, or the built-in one when none is configured.
    pub fn from_config(config: &CoreConfig) -> Self {
        match &config.canonical_document_types {
            Some(entries) => Self::new(entries.iter().cloned()),
            None => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CanonicalTypeEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry for untyped documents. A configured table that lacks one
    /// still gets a plain "Additional Documents" title.
    fn fallback(&self) -> CanonicalTypeEntry {
        self.get(ADDITIONAL_DOCUMENTS)
            .cloned()
            .unwrap_or_else(|| entry(ADDITIONAL_DOCUMENTS, ADDITIONAL_DOCUMENTS, None))
    }
}

impl Default for CanonicalDocumentTypes {
    fn default() -> Self {
        Self::new([
            entry(
                "Degree Certificate",
                "Degree Certificate",
                Some("Certificate confirming the degree awarded by your previous institution"),
            ),
            entry(
                "Standardized Exams",
                "Standardized Exam Results",
                Some("Score reports such as SAT, GRE, GMAT, TOEFL or IELTS"),
            ),
            entry(
                "Academic Transcript",
                "Academic Transcript",
                Some("Official record of your courses and grades"),
            ),
            entry(
                "Diploma/Certificate",
                "Diploma / Certificate",
                Some("High school diploma or an equivalent certificate"),
            ),
            entry(
                "Nüfus Kayıt Örneği",
                "Population Registry Record",
                Some("Extract from the Turkish civil population registry"),
            ),
            entry(
                ADDITIONAL_DOCUMENTS,
                ADDITIONAL_DOCUMENTS,
                Some("Other supporting documents"),
            ),
            entry(
                PAYMENT_RECEIPT,
                PAYMENT_RECEIPT,
                Some("Proof of payment of the tuition deposit"),
            ),
        ])
    }
}

fn entry(key: &str, title: &str, description: Option<&str>) -> CanonicalTypeEntry {
    CanonicalTypeEntry {
        key: key.to_string(),
        title: title.to_string(),
        description: description.map(str::to_string),
    }
}

/// Compute the label of a document. Pure.
pub fn resolve_document_display(
    table: &CanonicalDocumentTypes,
    document: &DocumentEntry,
) -> DisplayDescriptor {
    let file_name = document.document.file_name.as_str();
    let differs_from = |name: &str| (file_name != name).then(|| file_name.to_string());

    if let Some(type_name) = document.type_name()
        && let Some(canonical) = table.get(type_name)
    {
        return DisplayDescriptor {
            title: canonical.title.clone(),
            description: canonical.description.clone(),
            original_file_name: differs_from(type_name),
        };
    }

    if let Some(canonical) = table.get(file_name) {
        return DisplayDescriptor {
            title: canonical.title.clone(),
            description: canonical.description.clone(),
            original_file_name: None,
        };
    }

    match &document.doc_type {
        Some(doc_type) => DisplayDescriptor {
            title: doc_type.name.clone(),
            description: doc_type.description.clone(),
            original_file_name: differs_from(&doc_type.name),
        },
        None => {
            let fallback = table.fallback();
            DisplayDescriptor {
                title: fallback.title,
                description: fallback.description,
                original_file_name: Some(file_name.to_string()),
            }
        }
    }
}
