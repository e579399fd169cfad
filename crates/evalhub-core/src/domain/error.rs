//! Domain-level error taxonomy for EvalHub.

use evalhub_store::StorageError;

/// EvalHub domain errors.
#[derive(Debug, thiserror::Error)]
pub enum EvalHubError {
    #[error("malformed artifact filename {filename:?}: {reason}")]
    MalformedFilename { filename: String, reason: String },

    #[error("invalid run id {value:?}: {reason}")]
    InvalidRunId { value: String, reason: String },

    #[error("sample {index} of task {task} is missing required field: {field}")]
    MissingSampleField {
        task: String,
        index: usize,
        field: String,
    },

    #[error("sample {index} of task {task} has malformed field {field}: {reason}")]
    InvalidSampleField {
        task: String,
        index: usize,
        field: String,
        reason: String,
    },

    #[error("invalid results document: {0}")]
    InvalidResultsDocument(String),

    #[error("invalid dataset card: {0}")]
    InvalidCard(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("card header error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for EvalHub domain operations.
pub type Result<T> = std::result::Result<T, EvalHubError>;
