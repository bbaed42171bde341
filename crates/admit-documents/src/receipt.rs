//! Payment receipt detection and the student email gate.

use admit_model::{DocumentEntry, Role};

/// Decides whether a document is a payment receipt.
pub trait PaymentReceiptPredicate: Send + Sync {
    fn is_payment_receipt(&self, document: &DocumentEntry) -> bool;
}

/// Name-based receipt detection.
///
/// Matches a type name containing "payment receipt", or a file name that
/// contains both "payment" and "receipt" in any order. Case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameHeuristic;

impl PaymentReceiptPredicate for NameHeuristic {
    fn is_payment_receipt(&self, document: &DocumentEntry) -> bool {
        if document
            .type_name()
            .is_some_and(|name| name.to_lowercase().contains("payment receipt"))
        {
            return true;
        }
        let file_name = document.document.file_name.to_lowercase();
        file_name.contains("payment") && file_name.contains("receipt")
    }
}

impl<F> PaymentReceiptPredicate for F
where
    F: Fn(&DocumentEntry) -> bool + Send + Sync,
{
    fn is_payment_receipt(&self, document: &DocumentEntry) -> bool {
        self(document)
    }
}

/// Whether any of the shared documents is a payment receipt.
pub fn has_payment_receipt_shared(
    predicate: &dyn PaymentReceiptPredicate,
    shared: &[DocumentEntry],
) -> bool {
    shared.iter().any(|entry| predicate.is_payment_receipt(entry))
}

/// Whether a viewer may see the student's email address.
///
/// Officials only see it once the student has shared a payment receipt with
/// the application.
pub fn can_view_student_email(role: Role, has_payment_receipt_shared: bool) -> bool {
    match role {
        Role::Student | Role::Administrator => true,
        Role::UniversityOfficial => has_payment_receipt_shared,
    }
}
