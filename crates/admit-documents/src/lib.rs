//! Documents in the admissions core.
//!
//! - `display` - canonical document types and the display-name resolver
//! - `receipt` - payment receipt detection and the student email gate
//! - `library` - upload, verification and listing of a student's documents
//! - `visibility` - which documents a reviewer sees for an application
//! - `ledger` - the per-application selection of shared documents
//! - `error` - document errors with user-facing notifications

mod display;
mod error;
mod ledger;
mod library;
mod receipt;
mod visibility;

pub use display::{
    ADDITIONAL_DOCUMENTS, CanonicalDocumentTypes, DisplayDescriptor, PAYMENT_RECEIPT,
    resolve_document_display,
};
pub use error::{DocumentError, Result};
pub use ledger::{PendingSave, SaveOutcome, SaveTracker, SelectionLedger, SelectionStatus, Toggle};
pub use library::DocumentLibrary;
pub use receipt::{
    NameHeuristic, PaymentReceiptPredicate, can_view_student_email, has_payment_receipt_shared,
};
pub use visibility::SharedDocuments;
