//! Data model for the admissions core.
//!
//! This crate holds everything the other admissions crates agree on:
//!
//! - `ids` - opaque identifiers for applications, students, documents, ...
//! - `enums` - application status, viewer roles and acting principals
//! - `application` - the application row and its free-form data bag
//! - `document` - uploaded documents and their controlled vocabulary
//! - `reference` - programs, offer letters, bank accounts, students
//! - `config` - core configuration loaded from JSON
//! - `clock` - injectable time source
//! - `error` - the error taxonomy shared by every crate

pub mod application;
pub mod clock;
pub mod config;
pub mod document;
pub mod enums;
pub mod error;
pub mod ids;
pub mod reference;

pub use application::{
    Application, ApplicationData, DEFAULT_MISSING_FIELDS, KEY_PAYMENT_DUE_DATE,
    KEY_PAYMENT_STATUS, KEY_SHARED_DOCUMENT_IDS, RESERVED_DATA_KEYS, format_timestamp,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    CanonicalTypeEntry, CoreConfig, MAX_PAYMENT_WINDOW_DAYS, SelectionConfig, StorageConfig,
};
pub use document::{Document, DocumentEntry, DocumentType};
pub use enums::{Actor, ApplicationStatus, Role};
pub use error::{ErrorKind, ModelError, Notification, Result};
pub use ids::{
    ApplicationId, BankAccountId, DocumentId, DocumentTypeId, OfferLetterId, ProgramId,
    StudentId, UniversityId,
};
pub use reference::{BankAccount, OfferLetter, Program, Student};
