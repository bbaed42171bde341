//! A student's document library: upload, verification and typed listing.

use std::collections::HashMap;
use std::sync::Arc;

use admit_model::{
    Actor, Application, ApplicationData, ApplicationId, Clock, CoreConfig, Document, DocumentEntry,
    DocumentId, DocumentType, DocumentTypeId, Role, StudentId, SystemClock,
};
use admit_store::{
    Filter, ObjectStore, PersistenceGateway, Row, Table, fetch_all, fetch_one, insert_record,
    sanitize_object_name,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::display::{CanonicalDocumentTypes, DisplayDescriptor, resolve_document_display};
use crate::error::{DocumentError, Result};
use crate::receipt::{NameHeuristic, PaymentReceiptPredicate};

/// Document operations against the store.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct DocumentLibrary {
    gateway: Arc<dyn PersistenceGateway>,
    objects: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    config: Arc<CoreConfig>,
    canonical: Arc<CanonicalDocumentTypes>,
    receipts: Arc<dyn PaymentReceiptPredicate>,
}

impl DocumentLibrary {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        objects: Arc<dyn ObjectStore>,
        config: CoreConfig,
    ) -> Self {
        Self {
            gateway,
            objects,
            clock: Arc::new(SystemClock),
            canonical: Arc::new(CanonicalDocumentTypes::from_config(&config)),
            config: Arc::new(config),
            receipts: Arc::new(NameHeuristic),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_canonical_types(mut self, table: CanonicalDocumentTypes) -> Self {
        self.canonical = Arc::new(table);
        self
    }

    #[must_use]
    pub fn with_receipt_predicate(mut self, predicate: Arc<dyn PaymentReceiptPredicate>) -> Self {
        self.receipts = predicate;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn canonical_types(&self) -> &CanonicalDocumentTypes {
        &self.canonical
    }

    pub(crate) fn receipts(&self) -> &dyn PaymentReceiptPredicate {
        self.receipts.as_ref()
    }

    pub(crate) fn gateway(&self) -> &dyn PersistenceGateway {
        self.gateway.as_ref()
    }

    pub(crate) fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Label a document with the configured canonical table.
    pub fn describe(&self, entry: &DocumentEntry) -> DisplayDescriptor {
        resolve_document_display(&self.canonical, entry)
    }

    /// Every document a student uploaded, joined with its type.
    pub async fn documents_for_student(&self, student_id: &StudentId) -> Result<Vec<DocumentEntry>> {
        Ok(self.fetch_student_documents(student_id).await?)
    }

    /// Upload a file into the acting student's library.
    pub async fn upload_document(
        &self,
        actor: &Actor,
        doc_type_id: Option<DocumentTypeId>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Document> {
        let student_id = actor.student_id().ok_or(DocumentError::NotPermitted {
            role: actor.role(),
            action: "upload documents",
        })?;

        let document_id = DocumentId::generate();
        let bucket = &self.config.storage.bucket;
        let path = format!(
            "{}/{}-{}",
            student_id,
            document_id,
            sanitize_object_name(file_name)
        );
        self.objects.upload(bucket, &path, bytes).await?;

        let document = Document {
            id: document_id,
            student_id: student_id.clone(),
            doc_type_id,
            file_name: file_name.to_string(),
            file_url: self.objects.public_url(bucket, &path),
            uploaded_at: Some(self.clock.now()),
            is_verified: false,
            application_id: None,
        };
        let stored = insert_record(self.gateway.as_ref(), Table::Documents, &document).await?;
        info!(document_id = %stored.id, student_id = %student_id, "document uploaded");
        Ok(stored)
    }

    /// Mark a document as checked (or unchecked) by a reviewer.
    pub async fn set_document_verified(
        &self,
        actor: &Actor,
        document_id: &DocumentId,
        verified: bool,
    ) -> Result<Document> {
        if actor.role() == Role::Student {
            return Err(DocumentError::NotPermitted {
                role: Role::Student,
                action: "verify documents",
            });
        }

        let filter = Filter::by_id(document_id.as_str());
        let mut document: Document = fetch_one(self.gateway.as_ref(), Table::Documents, &filter)
            .await?
            .ok_or_else(|| DocumentError::DocumentNotFound(document_id.clone()))?;

        let mut patch = Row::new();
        patch.insert("is_verified".to_string(), Value::Bool(verified));
        self.gateway
            .write_row(Table::Documents, &filter, patch)
            .await?;

        document.is_verified = verified;
        info!(document_id = %document_id, verified, "document verification updated");
        Ok(document)
    }

    pub(crate) async fn load_application(&self, application_id: &ApplicationId) -> Result<Application> {
        fetch_one(
            self.gateway.as_ref(),
            Table::Applications,
            &Filter::by_id(application_id.as_str()),
        )
        .await?
        .ok_or_else(|| DocumentError::ApplicationNotFound(application_id.clone()))
    }

    pub(crate) async fn fetch_student_documents(
        &self,
        student_id: &StudentId,
    ) -> admit_store::Result<Vec<DocumentEntry>> {
        let documents = fetch_all(
            self.gateway.as_ref(),
            Table::Documents,
            &Filter::new().eq("student_id", student_id.as_str()),
        )
        .await?;
        self.join_types(documents).await
    }

    /// Attach each document's type, in one read.
    pub(crate) async fn join_types(
        &self,
        documents: Vec<Document>,
    ) -> admit_store::Result<Vec<DocumentEntry>> {
        let mut type_ids: Vec<&str> = documents
            .iter()
            .filter_map(|document| document.doc_type_id.as_ref().map(DocumentTypeId::as_str))
            .collect();
        type_ids.sort_unstable();
        type_ids.dedup();

        let types: HashMap<DocumentTypeId, DocumentType> = if type_ids.is_empty() {
            HashMap::new()
        } else {
            fetch_all::<DocumentType>(
                self.gateway.as_ref(),
                Table::DocumentTypes,
                &Filter::new().is_in("id", type_ids),
            )
            .await?
            .into_iter()
            .map(|ty| (ty.id.clone(), ty))
            .collect()
        };

        Ok(documents
            .into_iter()
            .map(|document| {
                let doc_type = document
                    .doc_type_id
                    .as_ref()
                    .and_then(|id| types.get(id))
                    .cloned();
                DocumentEntry::new(document, doc_type)
            })
            .collect())
    }

    /// Replace the shared document list of an application.
    ///
    /// Reads the current data bag, swaps the one key and writes the whole bag
    /// back, so keys owned by other features survive. There is no version
    /// check between the read and the write.
    pub(crate) async fn write_shared_document_ids(
        &self,
        application_id: &ApplicationId,
        ids: &[DocumentId],
    ) -> Result<()> {
        let filter = Filter::by_id(application_id.as_str());
        let row = self
            .gateway
            .read_row(Table::Applications, &filter)
            .await?
            .ok_or_else(|| DocumentError::ApplicationNotFound(application_id.clone()))?;

        let mut data = ApplicationData::from_value(row.get("application_data"));
        data.set_shared_document_ids(ids);

        let mut patch = Row::new();
        patch.insert("application_data".to_string(), data.into_value());
        self.gateway
            .write_row(Table::Applications, &filter, patch)
            .await?;
        debug!(application_id = %application_id, shared = ids.len(), "shared documents saved");
        Ok(())
    }
}
