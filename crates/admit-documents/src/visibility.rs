//! Which documents a reviewer sees for an application, and whether they see
//! the student's email address.

use std::collections::HashMap;

use admit_model::{Actor, Application, Document, DocumentEntry, DocumentId, Program, Role, Student};
use admit_store::{Filter, Table, fetch_all, fetch_one};
use tracing::debug;

use crate::error::{DocumentError, Result};
use crate::library::DocumentLibrary;
use crate::receipt::{can_view_student_email, has_payment_receipt_shared};

/// Documents shown to a viewer of one application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedDocuments {
    pub documents: Vec<DocumentEntry>,
    /// Shared ids whose document no longer exists.
    pub missing_ids: Vec<DocumentId>,
}

impl SharedDocuments {
    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.iter().any(|entry| entry.id() == id)
    }
}

/// Insertion-ordered document list, deduplicated by id. A later copy of a
/// document replaces the earlier one in place.
#[derive(Default)]
struct MergedDocuments {
    documents: Vec<Document>,
    index: HashMap<DocumentId, usize>,
}

impl MergedDocuments {
    fn upsert(&mut self, document: Document) {
        match self.index.get(&document.id) {
            Some(&position) => self.documents[position] = document,
            None => {
                self.index.insert(document.id.clone(), self.documents.len());
                self.documents.push(document);
            }
        }
    }

    fn contains(&self, id: &DocumentId) -> bool {
        self.index.contains_key(id)
    }
}

impl DocumentLibrary {
    /// Documents a viewer sees on an application.
    ///
    /// Administrators see the documents tagged with the application followed
    /// by the ones the student shared. Everybody else sees only the shared
    /// ones, in the order they were shared.
    pub async fn shared_documents_for(
        &self,
        viewer: &Actor,
        application: &Application,
    ) -> Result<SharedDocuments> {
        self.ensure_can_view(viewer, application).await?;

        let mut merged = MergedDocuments::default();
        if viewer.role() == Role::Administrator {
            let tagged: Vec<Document> = fetch_all(
                self.gateway(),
                Table::Documents,
                &Filter::new().eq("application_id", application.id.as_str()),
            )
            .await?;
            for document in tagged {
                merged.upsert(document);
            }
        }

        let shared_ids = application.application_data.shared_document_ids();
        let mut missing_ids = Vec::new();
        if !shared_ids.is_empty() {
            let found: Vec<Document> = fetch_all(
                self.gateway(),
                Table::Documents,
                &Filter::new()
                    .is_in("id", shared_ids.iter().map(DocumentId::as_str))
                    .eq("student_id", application.student_id.as_str()),
            )
            .await?;
            let mut found: HashMap<DocumentId, Document> = found
                .into_iter()
                .map(|document| (document.id.clone(), document))
                .collect();

            for id in &shared_ids {
                match found.remove(id) {
                    Some(document) => merged.upsert(document),
                    None if !merged.contains(id) && !missing_ids.contains(id) => {
                        missing_ids.push(id.clone());
                    }
                    None => {}
                }
            }
        }

        if !missing_ids.is_empty() {
            debug!(
                application_id = %application.id,
                missing = missing_ids.len(),
                "shared documents missing from the student library"
            );
        }

        Ok(SharedDocuments {
            documents: self.join_types(merged.documents).await?,
            missing_ids,
        })
    }

    /// The student's email address, if the viewer may see it.
    ///
    /// Evaluated against `shared`, so it follows every change of the shared
    /// set.
    pub async fn student_contact(
        &self,
        viewer: &Actor,
        application: &Application,
        shared: &SharedDocuments,
    ) -> Result<Option<String>> {
        let has_receipt = has_payment_receipt_shared(self.receipts(), &shared.documents);
        if !can_view_student_email(viewer.role(), has_receipt) {
            return Ok(None);
        }

        let student: Option<Student> = fetch_one(
            self.gateway(),
            Table::Students,
            &Filter::by_id(application.student_id.as_str()),
        )
        .await?;
        Ok(student.map(|student| student.email))
    }

    async fn ensure_can_view(&self, viewer: &Actor, application: &Application) -> Result<()> {
        let allowed = match viewer {
            Actor::Administrator => true,
            Actor::Student { student_id } => *student_id == application.student_id,
            Actor::UniversityOfficial { university_id } => {
                let program: Option<Program> = fetch_one(
                    self.gateway(),
                    Table::Programs,
                    &Filter::by_id(application.program_id.as_str()),
                )
                .await?;
                program.is_some_and(|program| program.university_id == *university_id)
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(DocumentError::NotPermitted {
                role: viewer.role(),
                action: "view documents of this application",
            })
        }
    }
}
