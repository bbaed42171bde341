//! Snapshot loading operations.

use std::fs;
use std::path::Path;

use crate::error::{GatewayError, Result};
use crate::memory::StoreSnapshot;

/// Load a store snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<StoreSnapshot> {
    let bytes = fs::read(path).map_err(|e| GatewayError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;

    let snapshot: StoreSnapshot =
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::InvalidSnapshot {
            path: path.to_path_buf(),
            source: e,
        })?;

    tracing::info!(
        rows = snapshot.row_count(),
        "Loaded store snapshot from {}",
        path.display()
    );
    Ok(snapshot)
}

/// Load a snapshot without blocking the async runtime.
pub async fn load_snapshot_async(path: std::path::PathBuf) -> Result<StoreSnapshot> {
    tokio::task::spawn_blocking(move || load_snapshot(&path))
        .await
        .map_err(|e| GatewayError::Io {
            operation: "read",
            path: std::path::PathBuf::new(),
            source: std::io::Error::other(e),
        })?
}
