//! One command invocation's view of the store.
//!
//! Rows live in a JSON snapshot file that is loaded at start and written back
//! after a mutating command. Uploaded files live in a sibling directory named
//! after the snapshot (`store.json` keeps its objects in `store.objects/`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use admit_documents::DocumentLibrary;
use admit_lifecycle::ApplicationService;
use admit_model::{Clock, CoreConfig, StorageConfig, SystemClock};
use admit_store::{
    DirectoryObjectStore, MemoryGateway, StoreSnapshot, load_snapshot_async, save_snapshot_async,
};
use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Base URL used when the configured prefix is not `<base>/object/public/<bucket>/`.
const FALLBACK_BASE_URL: &str = "https://storage.local";

pub struct Session {
    store_path: PathBuf,
    gateway: Arc<MemoryGateway>,
    objects: Arc<DirectoryObjectStore>,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
}

impl Session {
    /// Load the snapshot at `store_path` (empty if it does not exist yet) and
    /// the configuration at `config_path` (defaults if absent).
    pub async fn open(store_path: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) if path.exists() => CoreConfig::from_path(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?,
            Some(path) => {
                warn!(path = %path.display(), "configuration file not found, using defaults");
                CoreConfig::default()
            }
            None => CoreConfig::default(),
        };

        let snapshot = if store_path.exists() {
            load_snapshot_async(store_path.to_path_buf())
                .await
                .with_context(|| format!("failed to load store {}", store_path.display()))?
        } else {
            debug!(path = %store_path.display(), "starting with an empty store");
            StoreSnapshot::new()
        };

        let objects = DirectoryObjectStore::new(
            objects_dir_for(store_path),
            storage_base_url(&config.storage),
        );

        Ok(Self {
            store_path: store_path.to_path_buf(),
            gateway: Arc::new(MemoryGateway::from_snapshot(snapshot)),
            objects: Arc::new(objects),
            config,
            clock: Arc::new(SystemClock),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn gateway(&self) -> &Arc<MemoryGateway> {
        &self.gateway
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn applications(&self) -> ApplicationService {
        ApplicationService::new(
            self.gateway.clone(),
            self.objects.clone(),
            self.config.clone(),
        )
        .with_clock(Arc::clone(&self.clock))
    }

    pub fn documents(&self) -> DocumentLibrary {
        DocumentLibrary::new(
            self.gateway.clone(),
            self.objects.clone(),
            self.config.clone(),
        )
        .with_clock(Arc::clone(&self.clock))
    }

    /// Write the store back to its snapshot file.
    pub async fn save(&self) -> Result<()> {
        let snapshot = self.gateway.snapshot().await;
        save_snapshot_async(snapshot, self.store_path.clone())
            .await
            .with_context(|| format!("failed to save store {}", self.store_path.display()))
    }
}

/// `data/store.json` keeps its objects in `data/store.objects`.
pub fn objects_dir_for(store_path: &Path) -> PathBuf {
    store_path.with_extension("objects")
}

/// The object store base URL implied by the configured public-URL prefix, so
/// that URLs handed out on upload can be mapped back to storage paths.
pub fn storage_base_url(storage: &StorageConfig) -> String {
    let suffix = format!("/object/public/{}", storage.bucket);
    storage
        .public_url_prefix
        .trim_end_matches('/')
        .strip_suffix(suffix.as_str())
        .unwrap_or(FALLBACK_BASE_URL)
        .to_string()
}
