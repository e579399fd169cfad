//! Storage trait definitions for EvalHub
//!
//! The remote artifact repository is modelled as an append-only,
//! path-addressed object store:
//! - `list(prefix)`: ordered set of every stored path starting with `prefix`
//! - `put(path, bytes)`: create or overwrite the object at `path`
//! - `get(path)`: read the object back
//!
//! Traits are synchronous and backend-agnostic. An in-memory fake lives in
//! the `fakes` module; a filesystem-backed store lives in `fs`.

use std::sync::Arc;

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// ArtifactPath
// ---------------------------------------------------------------------------

/// Relative, `/`-separated path of an object inside the store.
///
/// The inner field is private so that every value has passed validation:
/// non-empty, not absolute, no backslashes, no empty/`.`/`..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactPath(String);

impl ArtifactPath {
    /// Return the full path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment (the filename).
    pub fn basename(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Join a child segment onto this path.
    pub fn join(&self, child: &str) -> StorageResult<Self> {
        ArtifactPath::try_from(format!("{}/{}", self.0, child))
    }
}

impl TryFrom<String> for ArtifactPath {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let invalid = s.is_empty()
            || s.starts_with('/')
            || s.contains('\\')
            || s.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
        if invalid {
            return Err(StorageError::InvalidPath { path: s });
        }
        Ok(ArtifactPath(s))
    }
}

impl TryFrom<&str> for ArtifactPath {
    type Error = StorageError;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        ArtifactPath::try_from(s.to_string())
    }
}

impl std::fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Path-addressed artifact store.
///
/// Guarantees:
/// - `list` returns each stored path once, in ascending path order.
/// - `get(path)` returns the exact bytes of the last `put(path, ..)`.
/// - A failed `put` leaves the previous object (if any) untouched.
pub trait ArtifactStore: Send + Sync {
    /// List every stored path that starts with `prefix` (`""` lists all).
    fn list(&self, prefix: &str) -> StorageResult<Vec<ArtifactPath>>;

    /// Store `data` at `path`, replacing any previous object.
    fn put(&self, path: &ArtifactPath, data: &[u8]) -> StorageResult<()>;

    /// Retrieve the object at `path`. Returns `StorageError::NotFound` if absent.
    fn get(&self, path: &ArtifactPath) -> StorageResult<Vec<u8>>;
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for Arc<S> {
    fn list(&self, prefix: &str) -> StorageResult<Vec<ArtifactPath>> {
        (**self).list(prefix)
    }

    fn put(&self, path: &ArtifactPath, data: &[u8]) -> StorageResult<()> {
        (**self).put(path, data)
    }

    fn get(&self, path: &ArtifactPath) -> StorageResult<Vec<u8>> {
        (**self).get(path)
    }
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for Box<S> {
    fn list(&self, prefix: &str) -> StorageResult<Vec<ArtifactPath>> {
        (**self).list(prefix)
    }

    fn put(&self, path: &ArtifactPath, data: &[u8]) -> StorageResult<()> {
        (**self).put(path, data)
    }

    fn get(&self, path: &ArtifactPath) -> StorageResult<Vec<u8>> {
        (**self).get(path)
    }
}
