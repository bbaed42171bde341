//! The object store seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Arguments of a transform invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    pub bucket: String,
    pub path: String,
}

impl TransformRequest {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }
}

/// Make a user-supplied file name safe to use as the last object path segment.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_object_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Path-addressable blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<()>;

    /// Public URL of an object. Pure string construction, no I/O.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>>;

    /// Ask the store to run a named post-processing transform on an object.
    ///
    /// Best-effort: the transform runs server-side and may finish after this
    /// call returns.
    async fn invoke_transform(&self, name: &str, request: &TransformRequest) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_object_name() {
        assert_eq!(sanitize_object_name("Diploma (final).pdf"), "Diploma__final_.pdf");
        assert_eq!(sanitize_object_name("öğrenci belgesi.png"), "__renci_belgesi.png");
        assert_eq!(sanitize_object_name("   "), "file");
    }
}
