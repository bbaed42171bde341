//! Snapshot saving operations.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{GatewayError, Result};
use crate::memory::StoreSnapshot;

/// Save a store snapshot as pretty-printed JSON.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a
/// half-written snapshot behind.
pub fn save_snapshot(snapshot: &StoreSnapshot, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| GatewayError::InvalidSnapshot {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_atomic(path, &bytes)?;

    tracing::info!(
        rows = snapshot.row_count(),
        "Saved store snapshot to {}",
        path.display()
    );
    Ok(())
}

/// Write `bytes` to `path` through a sibling temp file and a rename,
/// creating parent directories as needed.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GatewayError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| GatewayError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(bytes).map_err(|e| GatewayError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| GatewayError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| GatewayError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

/// `store.json` becomes `store.json.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save a snapshot without blocking the async runtime.
pub async fn save_snapshot_async(snapshot: StoreSnapshot, path: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || save_snapshot(&snapshot, &path))
        .await
        .map_err(|e| GatewayError::Io {
            operation: "write",
            path: PathBuf::new(),
            source: std::io::Error::other(e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_save_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut snapshot = StoreSnapshot::new();
        snapshot.push(
            Table::Programs,
            json!({ "id": "p1", "university_id": "u1", "name": "Law" })
                .as_object()
                .cloned()
                .unwrap(),
        );

        save_snapshot(&snapshot, &path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"programs\""));
    }
}
