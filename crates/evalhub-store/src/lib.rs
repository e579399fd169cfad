//! EvalHub Store: artifact repository access for EvalHub
//!
//! This crate provides the boundary to the remote artifact repository that
//! evaluation results, sample dumps and the dataset card are published to.
//!
//! ## Key Components
//!
//! - `ArtifactStore`: path-addressed `list`/`put`/`get` contract
//! - `ArtifactPath`: validated relative object path
//! - `FsArtifactStore`: filesystem-backed store with atomic writes
//! - `MemoryArtifactStore`: in-memory fake with failure injection

mod error;
pub mod fakes;
pub mod fs;
pub mod storage_traits;

pub use error::StorageError;
pub use fakes::MemoryArtifactStore;
pub use fs::FsArtifactStore;
pub use storage_traits::{ArtifactPath, ArtifactStore, StorageResult};
