//! The document selection ledger.
//!
//! A student picks which of their documents an application shares with the
//! university. Selection changes apply to the local set at once and are
//! persisted in the background as a read-merge-write of the whole set.
//!
//! Documents entering the selection are watermarked once per ledger. The
//! watermark transform is best-effort: failures are logged and the document
//! is never retried.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use admit_model::{
    Actor, ApplicationId, DocumentEntry, DocumentId, Role, StorageConfig, StudentId,
};
use admit_store::{BackgroundEffect, GatewayError, TransformRequest};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{DocumentError, Result};
use crate::library::DocumentLibrary;

/// Save bookkeeping for the selection.
///
/// Counts saves in flight instead of holding a single flag, so that one save
/// finishing does not clear the indicator while another is still running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveTracker {
    pending: usize,
    last_saved_at: Option<DateTime<Utc>>,
    save_error: Option<String>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a save is in progress.
    #[inline]
    pub fn is_saving(&self) -> bool {
        self.pending > 0
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    /// Mark that a save has started.
    pub fn start_save(&mut self) {
        self.pending += 1;
    }

    /// Mark that a save has completed successfully.
    pub fn save_complete(&mut self, at: DateTime<Utc>) {
        self.finish();
        self.last_saved_at = Some(at);
        self.save_error = None;
    }

    /// Mark that a save has failed. The local selection is kept.
    pub fn save_failed(&mut self, message: impl Into<String>) {
        self.finish();
        self.save_error = Some(message.into());
    }

    /// Mark that a save was dropped in favor of a newer one.
    pub fn save_superseded(&mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }
}

/// How a background save ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The store rejected the write; the message is user-facing.
    Failed(String),
    /// A newer change arrived during the debounce window.
    Superseded,
}

/// Handle to a background save.
#[derive(Debug)]
#[must_use = "drop the handle to let the save run unobserved, or await `settled`"]
pub struct PendingSave {
    handle: JoinHandle<SaveOutcome>,
}

impl PendingSave {
    pub async fn settled(self) -> SaveOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => SaveOutcome::Failed(e.to_string()),
        }
    }

    pub fn detach(self) {}
}

/// Result of flipping one document.
#[derive(Debug)]
pub struct Toggle {
    /// Whether the document is selected now.
    pub selected: bool,
    pub save: PendingSave,
    /// Watermarking of newly selected documents, if any needed it.
    pub watermark: Option<BackgroundEffect>,
}

/// Snapshot of the ledger for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStatus {
    pub selected: Vec<DocumentId>,
    pub is_saving: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub save_error: Option<String>,
}

#[derive(Debug)]
struct LedgerState {
    selected: BTreeSet<DocumentId>,
    tracker: SaveTracker,
    /// Documents already sent for watermarking (or skipped). Never cleared.
    attempted: HashSet<DocumentId>,
    documents: Vec<DocumentEntry>,
    alive: bool,
    /// Bumped on every change; a debounced save only runs if it is current.
    generation: u64,
}

/// Selection of shared documents for one application.
///
/// Cloning yields another handle to the same ledger.
#[derive(Clone)]
pub struct SelectionLedger {
    library: DocumentLibrary,
    application_id: ApplicationId,
    student_id: StudentId,
    state: Arc<Mutex<LedgerState>>,
}

impl SelectionLedger {
    /// Load the shared set of an application and the student's documents.
    pub async fn load(
        library: DocumentLibrary,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<Self> {
        let application = library.load_application(application_id).await?;
        let owns = actor.student_id() == Some(&application.student_id);
        if !owns && actor.role() != Role::Administrator {
            return Err(DocumentError::NotPermitted {
                role: actor.role(),
                action: "choose documents for this application",
            });
        }

        let documents = library
            .fetch_student_documents(&application.student_id)
            .await?;
        let selected: BTreeSet<DocumentId> = application
            .application_data
            .shared_document_ids()
            .into_iter()
            .collect();
        debug!(
            application_id = %application_id,
            selected = selected.len(),
            documents = documents.len(),
            "document selection loaded"
        );

        Ok(Self {
            library,
            application_id: application_id.clone(),
            student_id: application.student_id,
            state: Arc::new(Mutex::new(LedgerState {
                selected,
                tracker: SaveTracker::new(),
                attempted: HashSet::new(),
                documents,
                alive: true,
                generation: 0,
            })),
        })
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    /// Flip one document in or out of the selection and start saving.
    ///
    /// The local set changes before this returns. Only documents of the
    /// application's student can be added; a stale id can always be removed.
    /// Must be called from within a tokio runtime.
    pub fn toggle(&self, document_id: &DocumentId) -> Result<Toggle> {
        let (selected, generation) = {
            let mut state = self.lock_live()?;
            let selected = if state.selected.remove(document_id) {
                false
            } else if state.documents.iter().any(|entry| entry.id() == document_id) {
                state.selected.insert(document_id.clone());
                true
            } else {
                return Err(DocumentError::NotInLibrary(document_id.clone()));
            };
            state.generation += 1;
            state.tracker.start_save();
            (selected, state.generation)
        };
        debug!(application_id = %self.application_id, document_id = %document_id, selected, "document toggled");

        let save = self.spawn_save(generation);
        let watermark = if selected {
            self.watermark_selected()
        } else {
            None
        };
        Ok(Toggle {
            selected,
            save,
            watermark,
        })
    }

    /// Send the current set again, typically after a failed save.
    pub fn retry_persist(&self) -> Result<PendingSave> {
        let generation = {
            let mut state = self.lock_live()?;
            state.generation += 1;
            state.tracker.start_save();
            state.generation
        };
        info!(application_id = %self.application_id, "retrying document selection save");
        Ok(self.spawn_save(generation))
    }

    /// Watermark every selected document that was not attempted yet.
    ///
    /// Documents whose URL is not a storage URL, or already carries the
    /// processed marker, are marked as attempted without a transform call.
    pub fn watermark_selected(&self) -> Option<BackgroundEffect> {
        let storage = &self.library.config().storage;
        let requests = {
            let mut state = self.lock();
            if !state.alive {
                return None;
            }
            let candidates: Vec<DocumentEntry> = state
                .documents
                .iter()
                .filter(|entry| {
                    state.selected.contains(entry.id()) && !state.attempted.contains(entry.id())
                })
                .cloned()
                .collect();

            let mut requests = Vec::new();
            for entry in candidates {
                state.attempted.insert(entry.id().clone());
                match storage_path(&entry.document.file_url, storage) {
                    Some(path) => requests.push((entry.id().clone(), path)),
                    None => debug!(document_id = %entry.id(), "watermark not needed"),
                }
            }
            requests
        };

        if requests.is_empty() {
            return None;
        }
        let ledger = self.clone();
        Some(BackgroundEffect::spawn(
            "watermark shared documents",
            async move { ledger.run_watermark(requests).await },
        ))
    }

    /// Re-read the student's documents.
    pub async fn refresh_documents(&self) -> Result<()> {
        self.reload_documents().await?;
        Ok(())
    }

    /// Stop applying results to this ledger. Writes already sent still land.
    pub fn close(&self) {
        self.lock().alive = false;
        debug!(application_id = %self.application_id, "document selection closed");
    }

    pub fn is_open(&self) -> bool {
        self.lock().alive
    }

    pub fn is_selected(&self, document_id: &DocumentId) -> bool {
        self.lock().selected.contains(document_id)
    }

    pub fn is_saving(&self) -> bool {
        self.lock().tracker.is_saving()
    }

    pub fn selected(&self) -> Vec<DocumentId> {
        self.lock().selected.iter().cloned().collect()
    }

    pub fn documents(&self) -> Vec<DocumentEntry> {
        self.lock().documents.clone()
    }

    pub fn status(&self) -> SelectionStatus {
        let state = self.lock();
        SelectionStatus {
            selected: state.selected.iter().cloned().collect(),
            is_saving: state.tracker.is_saving(),
            last_saved_at: state.tracker.last_saved_at(),
            save_error: state.tracker.save_error().map(str::to_string),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_live(&self) -> Result<MutexGuard<'_, LedgerState>> {
        let state = self.lock();
        if state.alive {
            Ok(state)
        } else {
            Err(DocumentError::LedgerClosed(self.application_id.clone()))
        }
    }

    fn spawn_save(&self, generation: u64) -> PendingSave {
        let ledger = self.clone();
        PendingSave {
            handle: tokio::spawn(async move { ledger.run_save(generation).await }),
        }
    }

    async fn run_save(self, generation: u64) -> SaveOutcome {
        let debounce = Duration::from_millis(self.library.config().selection.debounce_ms);
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
            let superseded = self.lock().generation != generation;
            if superseded {
                self.update_tracker(SaveTracker::save_superseded);
                return SaveOutcome::Superseded;
            }
        }

        // The set as it is now, not as it was when the save was requested.
        let ids = self.selected();
        match self
            .library
            .write_shared_document_ids(&self.application_id, &ids)
            .await
        {
            Ok(()) => {
                let at = self.library.clock().now();
                self.update_tracker(|tracker| tracker.save_complete(at));
                SaveOutcome::Saved
            }
            Err(e) => {
                warn!(application_id = %self.application_id, error = %e, "document selection save failed");
                let message = e.user_message();
                self.update_tracker(|tracker| tracker.save_failed(message.clone()));
                SaveOutcome::Failed(message)
            }
        }
    }

    fn update_tracker(&self, update: impl FnOnce(&mut SaveTracker)) {
        let mut state = self.lock();
        if state.alive {
            update(&mut state.tracker);
        }
    }

    async fn run_watermark(
        self,
        requests: Vec<(DocumentId, String)>,
    ) -> std::result::Result<(), GatewayError> {
        let storage = &self.library.config().storage;
        let mut succeeded = 0usize;
        let mut first_error = None;

        for (document_id, path) in requests {
            let request = TransformRequest::new(&storage.bucket, path);
            match self
                .library
                .objects()
                .invoke_transform(&storage.transform_name, &request)
                .await
            {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    warn!(document_id = %document_id, error = %e, "watermark failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if succeeded > 0 {
            self.reload_documents().await?;
            debug!(application_id = %self.application_id, succeeded, "documents watermarked");
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn reload_documents(&self) -> std::result::Result<(), GatewayError> {
        let documents = self.library.fetch_student_documents(&self.student_id).await?;
        let mut state = self.lock();
        if state.alive {
            state.documents = documents;
        }
        Ok(())
    }
}

/// Storage path of a public file URL, or `None` when the file should not be
/// watermarked.
fn storage_path(file_url: &str, storage: &StorageConfig) -> Option<String> {
    let marker = storage.processed_marker.as_str();
    if !marker.is_empty() && file_url.contains(marker) {
        return None;
    }
    file_url
        .strip_prefix(storage.public_url_prefix.as_str())
        .filter(|path| !path.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tracker_counts_overlapping_saves() {
        let mut tracker = SaveTracker::new();
        tracker.start_save();
        tracker.start_save();
        assert_eq!(tracker.pending(), 2);

        tracker.save_complete(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert!(tracker.is_saving());

        tracker.save_failed("network down");
        assert!(!tracker.is_saving());
        assert_eq!(tracker.save_error(), Some("network down"));
        assert!(tracker.last_saved_at().is_some());
    }

    #[test]
    fn test_success_clears_error() {
        let mut tracker = SaveTracker::new();
        tracker.start_save();
        tracker.save_failed("boom");
        tracker.start_save();
        tracker.save_complete(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(tracker.save_error(), None);
    }

    #[test]
    fn test_finish_never_underflows() {
        let mut tracker = SaveTracker::new();
        tracker.save_superseded();
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn test_storage_path() {
        let storage = StorageConfig::default();
        assert_eq!(
            storage_path(
                "https://storage.local/object/public/documents/s1/passport.pdf",
                &storage
            )
            .as_deref(),
            Some("s1/passport.pdf")
        );
        assert_eq!(
            storage_path(
                "https://storage.local/object/public/documents/s1/passport.pdf?v=2",
                &storage
            ),
            None
        );
        assert_eq!(storage_path("https://elsewhere.example/passport.pdf", &storage), None);
        assert_eq!(
            storage_path("https://storage.local/object/public/documents/", &storage),
            None
        );
    }
}
