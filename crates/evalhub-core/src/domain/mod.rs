//! Domain models for EvalHub.
//!
//! - `RunId`: identifier of one evaluation run, embedded in artifact names
//! - `ModelTracker`: evaluated model identity and timing
//! - `EvalHubError`: error taxonomy shared by the core modules

pub mod error;
pub mod run_id;
pub mod tracker;

pub use error::{EvalHubError, Result};
pub use run_id::RunId;
pub use tracker::{extract_model_name, sanitize_model_name, ModelTracker};
