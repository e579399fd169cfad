//! Error types for evalhub-store

use thiserror::Error;

/// Errors that can occur while talking to an artifact store
#[derive(Error, Debug)]
pub enum StorageError {
    /// No object stored at the requested path
    #[error("artifact not found: {path}")]
    NotFound { path: String },

    /// Path is empty, absolute, or escapes the store root
    #[error("invalid artifact path: {path}")]
    InvalidPath { path: String },

    /// Remote unreachable, permission denied, or any other transport failure
    #[error("transport failure during {operation}: {reason}")]
    Transport { operation: String, reason: String },

    /// Local filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether the failure came from the transport layer rather than the caller.
    pub fn is_transport(&self) -> bool {
        matches!(self, StorageError::Transport { .. } | StorageError::Io(_))
    }
}
