//! Filesystem-backed artifact store
//!
//! Artifacts live under a root directory at their repository-relative path.
//! Writes go through a temp file that is persisted into place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::StorageError;
use crate::storage_traits::{ArtifactPath, ArtifactStore, StorageResult};

/// Filesystem-backed artifact store.
///
/// Layout: `<root>/<artifact path>`, one file per object. Writes go through a
/// temp file in the destination directory followed by a rename.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a new `FsArtifactStore` rooted at `root`. Creates `root` if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory this store is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, path: &ArtifactPath) -> PathBuf {
        path.as_str()
            .split('/')
            .fold(self.root.clone(), |acc, seg| acc.join(seg))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn list(&self, prefix: &str) -> StorageResult<Vec<ArtifactPath>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| StorageError::Transport {
                operation: "list".to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            // Leftover temp files from interrupted writes are not artifacts.
            if rel.split('/').any(|seg| seg.starts_with(".tmp")) {
                continue;
            }
            if rel.starts_with(prefix) {
                paths.push(ArtifactPath::try_from(rel)?);
            }
        }
        paths.sort();
        debug!(root = %self.root.display(), prefix, count = paths.len(), "listed artifacts");
        Ok(paths)
    }

    fn put(&self, path: &ArtifactPath, data: &[u8]) -> StorageResult<()> {
        let target = self.object_path(path);
        let parent = target.parent().ok_or_else(|| StorageError::InvalidPath {
            path: path.as_str().to_string(),
        })?;
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(data)?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }

    fn get(&self, path: &ArtifactPath) -> StorageResult<Vec<u8>> {
        let target = self.object_path(path);
        fs::read(&target).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound {
                    path: path.as_str().to_string(),
                }
            } else {
                StorageError::Io(e)
            }
        })
    }
}
