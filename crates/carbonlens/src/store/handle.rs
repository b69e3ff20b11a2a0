//! Swappable, shared reference to the live dataset.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::info;

use super::dataset::DatasetStore;
use crate::config::StoreConfig;
use crate::error::{CarbonLensError, Result};

/// Shared handle to the current [`DatasetStore`].
///
/// Readers take a [`snapshot`](StoreHandle::snapshot) and keep using it for the
/// whole request. A reload builds the replacement completely before swapping
/// it in, so readers never see a half-built store.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    current: Arc<RwLock<Arc<DatasetStore>>>,
    source: Option<PathBuf>,
    config: StoreConfig,
}

impl StoreHandle {
    /// Wrap an already built store. Such a handle cannot [`reload`](Self::reload).
    pub fn new(store: DatasetStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
            source: None,
            config: StoreConfig::default(),
        }
    }

    /// Load a store from disk and remember where it came from.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = DatasetStore::load(&path, &config)?;
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
            source: Some(path),
            config,
        })
    }

    /// The store as it is right now.
    pub fn snapshot(&self) -> Arc<DatasetStore> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Atomically swap in a new store, returning the previous one.
    pub fn replace(&self, store: DatasetStore) -> Arc<DatasetStore> {
        let next = Arc::new(store);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }

    /// Re-read the source file and swap it in.
    ///
    /// On failure the live store is left untouched.
    pub fn reload(&self) -> Result<Arc<DatasetStore>> {
        let path = self.source.as_ref().ok_or_else(|| {
            CarbonLensError::Config("store was not opened from a file".to_string())
        })?;

        let store = DatasetStore::load(path, &self.config)?;
        let previous_hash = self.snapshot().fingerprint().to_string();
        let changed = previous_hash != store.fingerprint();
        self.replace(store);

        let current = self.snapshot();
        info!(
            path = %path.display(),
            changed,
            rows = current.row_count(),
            "Reloaded dataset"
        );
        Ok(current)
    }

    /// Path the store was loaded from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
