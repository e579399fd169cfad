//! Structured observability hooks for the publish lifecycle.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `PublishSpan` RAII guard
//! - Emission functions for key lifecycle events: artifacts saved, uploads
//!   failed, catalog rebuilt, card published
//!
//! Events are emitted at `info!` level, failures at `warn!`.

use tracing::{info, warn};

/// RAII guard that enters a run-scoped tracing span for one publish step.
///
/// # Example
///
/// ```ignore
/// let _span = PublishSpan::enter(&run_id, "results");
/// // every event logged here carries run_id and step
/// ```
pub struct PublishSpan {
    _span: tracing::span::EnteredSpan,
}

impl PublishSpan {
    pub fn enter(run_id: &str, step: &str) -> Self {
        let span = tracing::info_span!("evalhub.publish", run_id = %run_id, step = %step);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: aggregated results written locally.
pub fn emit_results_saved(run_id: &str, path: &str, tasks_hashed: usize) {
    info!(event = "results.saved", run_id = %run_id, path = %path, tasks_hashed = tasks_hashed);
}

/// Emit event: a task's samples written locally.
pub fn emit_samples_saved(run_id: &str, task: &str, path: &str, samples: usize) {
    info!(
        event = "samples.saved",
        run_id = %run_id,
        task = %task,
        path = %path,
        samples = samples,
    );
}

/// Emit event: an artifact reached the remote store.
pub fn emit_artifact_uploaded(path: &str, bytes: usize) {
    info!(event = "artifact.uploaded", path = %path, bytes = bytes);
}

/// Emit event: an upload failed (warning level). Publishing is best-effort.
pub fn emit_upload_failed(path: &str, error: &dyn std::fmt::Display) {
    warn!(event = "artifact.upload_failed", path = %path, error = %error);
}

/// Emit event: a publish step skipped because it is not configured.
pub fn emit_publish_skipped(step: &str, reason: &str) {
    info!(event = "publish.skipped", step = %step, reason = %reason);
}

/// Emit event: catalog rebuilt from a listing.
pub fn emit_catalog_built(configs: usize, results: usize, samples: usize) {
    info!(
        event = "catalog.built",
        configs = configs,
        results = results,
        samples = samples,
    );
}

/// Emit event: card rebuild after a samples upload failed; the session goes on.
pub fn emit_card_rebuild_failed(error: &dyn std::fmt::Display) {
    warn!(event = "card.rebuild_failed", error = %error);
}

/// Emit event: dataset card uploaded.
pub fn emit_card_published(repo_id: &str, configs: usize, runs: usize) {
    info!(event = "card.published", repo_id = %repo_id, configs = configs, runs = runs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_span_create() {
        let _span = PublishSpan::enter("2024-01-01T00-00-00.000000", "results");
        emit_publish_skipped("samples", "no output path");
    }
}
