//! Observability tests for the publish lifecycle.
//!
//! These tests verify that structured tracing events are emitted for the
//! key lifecycle steps and that the global counters move with them.

use evalhub_core::obs::{
    emit_artifact_uploaded, emit_card_published, emit_card_rebuild_failed, emit_catalog_built,
    emit_publish_skipped,
    emit_results_saved, emit_samples_saved, emit_upload_failed,
};
use evalhub_core::{CatalogBuilder, EvalPublisher, ModelTracker, PublishConfig, PublishSpan, RunId, METRICS};
use evalhub_store::MemoryArtifactStore;
use serde_json::json;
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_results_saved_logs_run_and_path() {
    emit_results_saved("2024-01-01T00-00-00.000000", "/tmp/out/results.json", 3);
    assert!(logs_contain("results.saved"));
    assert!(logs_contain("tasks_hashed=3"));
}

#[traced_test]
#[test]
fn test_emit_samples_saved_logs_task() {
    emit_samples_saved("run", "gsm8k", "/tmp/out/samples.json", 8);
    assert!(logs_contain("samples.saved"));
    assert!(logs_contain("gsm8k"));
}

#[traced_test]
#[test]
fn test_emit_upload_events() {
    emit_artifact_uploaded("m/results_t.json", 128);
    emit_upload_failed("m/samples_x_t.json", &"connection reset");
    assert!(logs_contain("artifact.uploaded"));
    assert!(logs_contain("artifact.upload_failed"));
    assert!(logs_contain("connection reset"));
}

#[traced_test]
#[test]
fn test_emit_catalog_and_card_events() {
    emit_catalog_built(4, 2, 6);
    emit_card_published("org/lm-eval-results", 4, 2);
    emit_publish_skipped("card", "no artifact store attached");
    assert!(logs_contain("catalog.built"));
    assert!(logs_contain("card.published"));
    assert!(logs_contain("publish.skipped"));
}

#[traced_test]
#[test]
fn test_emit_card_rebuild_failed_logs_error() {
    emit_card_rebuild_failed(&"malformed artifact filename");
    assert!(logs_contain("card.rebuild_failed"));
    assert!(logs_contain("malformed artifact filename"));
}

#[traced_test]
#[test]
fn test_publish_span_enter_creates_span() {
    let span = PublishSpan::enter("2024-01-01T00-00-00.000000", "samples");
    drop(span);
}

#[traced_test]
#[test]
fn test_catalog_build_counts_and_logs() {
    let before = METRICS.catalogs_built();
    CatalogBuilder::default()
        .build_from_paths(["m/samples_arc_2024-01-01T00-00-00.json"])
        .unwrap();
    assert!(METRICS.catalogs_built() > before);
    assert!(logs_contain("catalog.built"));
}

#[traced_test]
#[test]
fn test_failed_upload_is_logged_as_warning() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryArtifactStore::new();
    store.set_fail_puts(true);
    let config = PublishConfig::new(dir.path(), "org").with_push(true, false);
    let tracker = ModelTracker::start("hf", "pretrained=org/model");
    let mut publisher = EvalPublisher::new(config, tracker, Some(store));

    let before = METRICS.upload_failures();
    publisher
        .save_results_aggregated(
            &RunId::try_from("2024-01-01T00-00-00.000000").unwrap(),
            json!({"results": {}}),
            None,
        )
        .unwrap();
    assert!(METRICS.upload_failures() > before);
    assert!(logs_contain("artifact.upload_failed"));
    assert!(logs_contain("injected failure"));
}
