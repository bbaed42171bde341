//! In-memory object store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{GatewayError, Result};
use crate::object_store::{ObjectStore, TransformRequest};

/// Blob store held in memory.
///
/// Transforms do not touch the bytes; they are recorded so tests can assert
/// on how often and for which paths they were requested.
#[derive(Debug)]
pub struct MemoryObjectStore {
    base_url: String,
    objects: RwLock<BTreeMap<(String, String), Vec<u8>>>,
    transform_calls: Mutex<Vec<(String, TransformRequest)>>,
    fail_transforms: AtomicBool,
    fail_uploads: AtomicBool,
}

impl MemoryObjectStore {
    /// Create a store whose public URLs start with `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(BTreeMap::new()),
            transform_calls: Mutex::new(Vec::new()),
            fail_transforms: AtomicBool::new(false),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub fn fail_transforms(&self, fail: bool) {
        self.fail_transforms.store(fail, Ordering::Release);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::Release);
    }

    /// Every transform requested so far, in call order.
    pub fn transform_calls(&self) -> Vec<(String, TransformRequest)> {
        self.transform_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn contains(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .read()
            .await
            .contains_key(&(bucket.to_string(), path.to_string()))
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("https://storage.local")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<()> {
        if self.fail_uploads.load(Ordering::Acquire) {
            return Err(GatewayError::Storage {
                operation: "upload",
                bucket: bucket.to_string(),
                path: path.to_string(),
                message: "The object store rejected the upload".to_string(),
            });
        }
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), path.to_string()), bytes);
        tracing::debug!(bucket, path, "uploaded object");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, bucket, path)
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| GatewayError::Storage {
                operation: "download",
                bucket: bucket.to_string(),
                path: path.to_string(),
                message: "Object not found".to_string(),
            })
    }

    async fn invoke_transform(&self, name: &str, request: &TransformRequest) -> Result<()> {
        self.transform_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), request.clone()));

        if self.fail_transforms.load(Ordering::Acquire) {
            return Err(GatewayError::Storage {
                operation: "transform",
                bucket: request.bucket.clone(),
                path: request.path.clone(),
                message: format!("Transform '{name}' failed"),
            });
        }
        if !self.contains(&request.bucket, &request.path).await {
            return Err(GatewayError::Storage {
                operation: "transform",
                bucket: request.bucket.clone(),
                path: request.path.clone(),
                message: "Object not found".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_download_and_url() {
        let store = MemoryObjectStore::new("https://files.example/");
        store
            .upload("documents", "s1/passport.pdf", b"%PDF".to_vec())
            .await
            .unwrap();

        assert_eq!(
            store.download("documents", "s1/passport.pdf").await.unwrap(),
            b"%PDF".to_vec()
        );
        assert_eq!(
            store.public_url("documents", "s1/passport.pdf"),
            "https://files.example/object/public/documents/s1/passport.pdf"
        );
    }

    #[tokio::test]
    async fn test_transform_records_calls_even_when_failing() {
        let store = MemoryObjectStore::default();
        store.upload("documents", "a.pdf", vec![1]).await.unwrap();
        store.fail_transforms(true);

        let request = TransformRequest::new("documents", "a.pdf");
        assert!(store.invoke_transform("watermark", &request).await.is_err());
        assert_eq!(store.transform_calls().len(), 1);

        store.fail_transforms(false);
        assert!(store.invoke_transform("watermark", &request).await.is_ok());
        assert!(
            store
                .invoke_transform("watermark", &TransformRequest::new("documents", "missing.pdf"))
                .await
                .is_err()
        );
    }
}
