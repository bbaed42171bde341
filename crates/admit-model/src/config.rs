//! Core configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields a working configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Longest accepted payment window, in days.
pub const MAX_PAYMENT_WINDOW_DAYS: i64 = 365;

/// Top-level configuration for the admissions core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Days between acceptance and the payment due date, 1 to
    /// [`MAX_PAYMENT_WINDOW_DAYS`].
    pub payment_window_days: i64,

    /// Object store settings.
    pub storage: StorageConfig,

    /// Document selection auto-save settings.
    pub selection: SelectionConfig,

    /// Replaces the built-in canonical document type table when set.
    pub canonical_document_types: Option<Vec<CanonicalTypeEntry>>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            payment_window_days: 10,
            storage: StorageConfig::default(),
            selection: SelectionConfig::default(),
            canonical_document_types: None,
        }
    }
}

impl CoreConfig {
    /// Load configuration from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| ModelError::ConfigIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| ModelError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(ModelError::ConfigJson)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PAYMENT_WINDOW_DAYS).contains(&self.payment_window_days) {
            return Err(ModelError::InvalidConfig {
                field: "payment_window_days",
                message: format!(
                    "expected 1 to {MAX_PAYMENT_WINDOW_DAYS} days, got {}",
                    self.payment_window_days
                ),
            });
        }
        Ok(())
    }
}

/// Where student files live and how they are post-processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket holding student documents.
    pub bucket: String,

    /// Bucket holding university offer letters.
    pub offer_letter_bucket: String,

    /// Prefix of every public URL handed out by the object store.
    /// Stripping it from a `file_url` yields the storage path.
    pub public_url_prefix: String,

    /// Name of the watermark transform.
    pub transform_name: String,

    /// Query-style suffix marking a file that was already transformed.
    pub processed_marker: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "documents".to_string(),
            offer_letter_bucket: "offer-letters".to_string(),
            public_url_prefix: "https://storage.local/object/public/documents/".to_string(),
            transform_name: "watermark-document".to_string(),
            processed_marker: "?v=".to_string(),
        }
    }
}

/// Auto-save behavior of the document selection ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Debounce delay in milliseconds.
    ///
    /// A save waits this long and is dropped when a newer toggle arrived in
    /// the meantime. Zero saves every toggle immediately.
    pub debounce_ms: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { debounce_ms: 0 }
    }
}

/// One entry of the canonical document type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTypeEntry {
    /// Type name (or legacy file name) the entry is keyed by.
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = CoreConfig::default();
        assert_eq!(config.payment_window_days, 10);
        assert_eq!(config.selection.debounce_ms, 0);
        assert!(config.canonical_document_types.is_none());
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(CoreConfig::from_json("{}").unwrap(), CoreConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = CoreConfig::from_json(
            r#"{ "payment_window_days": 14, "storage": { "bucket": "uploads" } }"#,
        )
        .unwrap();
        assert_eq!(config.payment_window_days, 14);
        assert_eq!(config.storage.bucket, "uploads");
        assert_eq!(config.storage.transform_name, "watermark-document");
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "selection": { "debounce_ms": 250 } }"#)
            .unwrap();
        file.flush().unwrap();

        let config = CoreConfig::from_path(file.path()).unwrap();
        assert_eq!(config.selection.debounce_ms, 250);
    }

    #[test]
    fn test_payment_window_must_be_in_range() {
        for days in ["0", "-5", "366", "9223372036854775807"] {
            let raw = format!(r#"{{ "payment_window_days": {days} }}"#);
            assert!(
                matches!(
                    CoreConfig::from_json(&raw),
                    Err(ModelError::InvalidConfig {
                        field: "payment_window_days",
                        ..
                    })
                ),
                "{days} should be refused"
            );
        }
        assert_eq!(
            CoreConfig::from_json(r#"{ "payment_window_days": 365 }"#)
                .unwrap()
                .payment_window_days,
            365
        );
    }

    #[test]
    fn test_from_path_validates() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "payment_window_days": -5 }"#).unwrap();
        file.flush().unwrap();

        let err = CoreConfig::from_path(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_from_path_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            CoreConfig::from_path(file.path()),
            Err(ModelError::ConfigParse { .. })
        ));
    }
}
