//! The application row and its free-form data bag.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::enums::ApplicationStatus;
use crate::ids::{ApplicationId, DocumentId, ProgramId, StudentId};

/// Key of the shared document id list inside `application_data`.
pub const KEY_SHARED_DOCUMENT_IDS: &str = "shared_document_ids";

/// Key of the payment due date (ISO 8601) inside `application_data`.
pub const KEY_PAYMENT_DUE_DATE: &str = "payment_due_date";

/// Key of the payment status inside `application_data`.
pub const KEY_PAYMENT_STATUS: &str = "payment_status";

/// Keys of `application_data` written only by the core itself.
pub const RESERVED_DATA_KEYS: [&str; 3] = [
    KEY_SHARED_DOCUMENT_IDS,
    KEY_PAYMENT_DUE_DATE,
    KEY_PAYMENT_STATUS,
];

/// Fields a freshly created draft still has to fill in.
pub const DEFAULT_MISSING_FIELDS: [&str; 3] = ["personal_statement", "passport", "transcript"];

/// One student's candidacy for one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub application_data: ApplicationData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Create a new draft application.
    pub fn draft(student_id: StudentId, program_id: ProgramId, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::generate(),
            student_id,
            program_id,
            status: ApplicationStatus::Draft,
            submitted_at: None,
            application_data: ApplicationData::default(),
            missing_fields: DEFAULT_MISSING_FIELDS
                .iter()
                .map(|field| (*field).to_string())
                .collect(),
            created_at: Some(now),
        }
    }

    /// Derived display progress.
    pub fn progress(&self) -> u8 {
        self.status.progress()
    }
}

/// The open key-value bag stored in `applications.application_data`.
///
/// Only a handful of keys are known to the core. Every other key belongs to
/// some other feature and is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationData(Map<String, Value>);

impl ApplicationData {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Build from an arbitrary JSON value; anything but an object is empty.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self(map.clone()),
            _ => Self::default(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Reserved keys present in `patch`, in [`RESERVED_DATA_KEYS`] order.
    pub fn reserved_keys_in(patch: &Map<String, Value>) -> Vec<&'static str> {
        RESERVED_DATA_KEYS
            .into_iter()
            .filter(|key| patch.contains_key(*key))
            .collect()
    }

    /// Overlay every key of `patch` onto this bag.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.0.insert(key, value);
        }
    }

    /// Shared document ids. An absent or malformed entry reads as empty;
    /// non-string members are skipped.
    pub fn shared_document_ids(&self) -> Vec<DocumentId> {
        match self.0.get(KEY_SHARED_DOCUMENT_IDS) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(DocumentId::new)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_shared_document_ids<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a DocumentId>,
    {
        let ids = ids
            .into_iter()
            .map(|id| Value::String(id.as_str().to_string()))
            .collect();
        self.0
            .insert(KEY_SHARED_DOCUMENT_IDS.to_string(), Value::Array(ids));
    }

    pub fn payment_due_date(&self) -> Option<DateTime<Utc>> {
        self.0
            .get(KEY_PAYMENT_DUE_DATE)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_payment_due_date(&mut self, due: DateTime<Utc>) {
        self.0.insert(
            KEY_PAYMENT_DUE_DATE.to_string(),
            Value::String(format_timestamp(due)),
        );
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.0.get(KEY_PAYMENT_STATUS).and_then(Value::as_str)
    }

    /// Set the payment status unless one is already present.
    ///
    /// Returns `true` when the value was written.
    pub fn set_payment_status_if_absent(&mut self, status: &str) -> bool {
        if self.0.contains_key(KEY_PAYMENT_STATUS) {
            return false;
        }
        self.0.insert(
            KEY_PAYMENT_STATUS.to_string(),
            Value::String(status.to_string()),
        );
        true
    }
}

/// ISO 8601 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_shared_ids_absent_reads_empty() {
        let data = ApplicationData::default();
        assert!(data.shared_document_ids().is_empty());

        let data = ApplicationData::from_value(Some(&json!({ "shared_document_ids": "oops" })));
        assert!(data.shared_document_ids().is_empty());
    }

    #[test]
    fn test_shared_ids_skip_non_strings() {
        let data =
            ApplicationData::from_value(Some(&json!({ "shared_document_ids": ["a", 3, null, "b"] })));
        assert_eq!(
            data.shared_document_ids(),
            vec![DocumentId::new("a"), DocumentId::new("b")]
        );
    }

    #[test]
    fn test_set_shared_ids_keeps_other_keys() {
        let mut data = ApplicationData::from_value(Some(&json!({
            "payment_status": "paid",
            "essay": { "words": 500 }
        })));
        data.set_shared_document_ids(&[DocumentId::new("x")]);

        assert_eq!(data.payment_status(), Some("paid"));
        assert_eq!(data.get("essay"), Some(&json!({ "words": 500 })));
        assert_eq!(data.shared_document_ids(), vec![DocumentId::new("x")]);
    }

    #[test]
    fn test_payment_status_only_set_once() {
        let mut data = ApplicationData::default();
        assert!(data.set_payment_status_if_absent("pending_payment"));
        assert!(!data.set_payment_status_if_absent("other"));
        assert_eq!(data.payment_status(), Some("pending_payment"));
    }

    #[test]
    fn test_payment_due_date_round_trip() {
        let due = Utc.with_ymd_and_hms(2026, 3, 11, 9, 30, 0).unwrap();
        let mut data = ApplicationData::default();
        data.set_payment_due_date(due);

        assert_eq!(
            data.get(KEY_PAYMENT_DUE_DATE),
            Some(&json!("2026-03-11T09:30:00.000Z"))
        );
        assert_eq!(data.payment_due_date(), Some(due));
    }

    #[test]
    fn test_application_tolerates_null_columns() {
        let app: Application = serde_json::from_value(json!({
            "id": "a1",
            "student_id": "s1",
            "program_id": "p1",
            "status": "under_review",
            "submitted_at": null,
            "application_data": null,
            "missing_fields": null
        }))
        .unwrap();

        assert_eq!(app.status, ApplicationStatus::UnderReview);
        assert!(app.application_data.as_map().is_empty());
        assert!(app.missing_fields.is_empty());
        assert_eq!(app.progress(), 75);
    }

    #[test]
    fn test_draft_defaults() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let app = Application::draft(StudentId::new("s"), ProgramId::new("p"), now);
        assert_eq!(app.status, ApplicationStatus::Draft);
        assert_eq!(app.missing_fields.len(), DEFAULT_MISSING_FIELDS.len());
        assert_eq!(app.created_at, Some(now));
    }
}
