//! In-memory fake for the storage trait (testing only)
//!
//! Provides `MemoryArtifactStore`, which satisfies the `ArtifactStore`
//! contract without touching disk and can be told to fail writes so callers
//! can exercise their transport-failure paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryArtifactStore
// ---------------------------------------------------------------------------

/// In-memory artifact store backed by a `BTreeMap<path, bytes>`.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    objects: Mutex<BTreeMap<ArtifactPath, Vec<u8>>>,
    fail_puts: AtomicBool,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with empty objects at each of `paths`.
    pub fn with_paths<I, P>(paths: I) -> StorageResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let store = Self::new();
        for p in paths {
            store.put(&ArtifactPath::try_from(p.as_ref())?, b"")?;
        }
        Ok(store)
    }

    /// Make every subsequent `put` fail with a transport error.
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<ArtifactPath, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn list(&self, prefix: &str) -> StorageResult<Vec<ArtifactPath>> {
        Ok(self
            .objects()
            .keys()
            .filter(|p| p.as_str().starts_with(prefix))
            .cloned()
            .collect())
    }

    fn put(&self, path: &ArtifactPath, data: &[u8]) -> StorageResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Transport {
                operation: "put".to_string(),
                reason: format!("injected failure for {path}"),
            });
        }
        self.objects().insert(path.clone(), data.to_vec());
        Ok(())
    }

    fn get(&self, path: &ArtifactPath) -> StorageResult<Vec<u8>> {
        self.objects()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.as_str().to_string(),
            })
    }
}
