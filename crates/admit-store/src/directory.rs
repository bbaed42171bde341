//! Object store backed by a local directory.
//!
//! Objects live at `<root>/<bucket>/<path>`. Used by the command-line front
//! end so that uploads outlive a single run.

use std::fs;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{GatewayError, Result};
use crate::io::write_atomic;
use crate::object_store::{ObjectStore, TransformRequest};

#[derive(Debug, Clone)]
pub struct DirectoryObjectStore {
    root: PathBuf,
    base_url: String,
}

impl DirectoryObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local file of an object. Rejects paths that would leave the bucket.
    fn object_path(&self, operation: &'static str, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let contained = !bucket.is_empty()
            && !bucket.contains(['/', '\\'])
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !contained || path.is_empty() {
            return Err(GatewayError::Storage {
                operation,
                bucket: bucket.to_string(),
                path: path.to_string(),
                message: format!("Invalid object path '{path}'"),
            });
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl ObjectStore for DirectoryObjectStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<()> {
        let target = self.object_path("upload", bucket, path)?;
        tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
            .await
            .map_err(|e| GatewayError::Storage {
                operation: "upload",
                bucket: bucket.to_string(),
                path: path.to_string(),
                message: e.to_string(),
            })??;
        tracing::debug!(bucket, path, "stored object");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, bucket, path)
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        let source = self.object_path("download", bucket, path)?;
        let read = tokio::task::spawn_blocking(move || fs::read(source)).await;
        match read {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(GatewayError::Storage {
                operation: "download",
                bucket: bucket.to_string(),
                path: path.to_string(),
                message: e.to_string(),
            }),
            Err(e) => Err(GatewayError::Storage {
                operation: "download",
                bucket: bucket.to_string(),
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Local files have no server-side processing; the transform only checks
    /// that the object exists.
    async fn invoke_transform(&self, name: &str, request: &TransformRequest) -> Result<()> {
        let target = self.object_path("transform", &request.bucket, &request.path)?;
        if !target.is_file() {
            return Err(GatewayError::Storage {
                operation: "transform",
                bucket: request.bucket.clone(),
                path: request.path.clone(),
                message: "Object not found".to_string(),
            });
        }
        tracing::debug!(transform = name, bucket = %request.bucket, path = %request.path, "transform requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = tempdir().unwrap();
        let store = DirectoryObjectStore::new(dir.path(), "https://storage.local");

        store
            .upload("documents", "s1/transcript.pdf", b"%PDF".to_vec())
            .await
            .unwrap();
        assert!(dir.path().join("documents/s1/transcript.pdf").is_file());
        assert_eq!(
            store.download("documents", "s1/transcript.pdf").await.unwrap(),
            b"%PDF".to_vec()
        );
        assert!(
            store
                .invoke_transform("watermark", &TransformRequest::new("documents", "s1/transcript.pdf"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let store = DirectoryObjectStore::new(dir.path(), "https://storage.local");

        for path in ["../outside.pdf", "/etc/passwd", ""] {
            assert!(store.upload("documents", path, vec![1]).await.is_err());
        }
        assert!(store.upload("../documents", "a.pdf", vec![1]).await.is_err());
        assert!(store.download("documents", "missing.pdf").await.is_err());
    }
}
