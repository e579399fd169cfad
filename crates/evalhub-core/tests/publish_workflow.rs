//! End-to-end publish sessions against an in-memory artifact store.

use std::collections::BTreeMap;
use std::fs;

use evalhub_core::{
    compute_task_fingerprint, DatasetCard, EvalHubError, EvalPublisher, ModelTracker,
    PublishConfig, RunId, SampleHashes, CARD_PATH, LATEST_SPLIT,
};
use evalhub_store::{ArtifactPath, ArtifactStore, MemoryArtifactStore};
use serde_json::{json, Value};

const RUN: &str = "2024-01-01T00-00-00.000001";
const RESULTS_PATH: &str = "org__model/results_2024-01-01T00-00-00.000001.json";
const SAMPLES_PATH: &str = "org__model/samples_gsm8k_2024-01-01T00-00-00.000001.json";

fn run() -> RunId {
    RunId::try_from(RUN).unwrap()
}

fn sample(doc: &str) -> Value {
    json!({
        "doc_id": 0,
        "doc": {"question": doc},
        "target": "4",
        "arguments": [[format!("Q: {doc}\nA:"), {"until": ["\n"]}]],
        "resps": [[["4", false]]],
        "filtered_resps": [["4", false]],
        "doc_hash": format!("d-{doc}"),
        "prompt_hash": format!("p-{doc}"),
        "target_hash": "t-4",
    })
}

fn samples() -> BTreeMap<String, Vec<Value>> {
    BTreeMap::from([(
        "gsm8k".to_string(),
        vec![sample("2+2"), sample("1+3")],
    )])
}

fn results() -> Value {
    json!({"results": {"gsm8k": {"exact_match,strict-match": 0.5}}, "config": {"batch_size": 1}})
}

fn publisher(
    dir: &tempfile::TempDir,
    store: Option<MemoryArtifactStore>,
) -> EvalPublisher<MemoryArtifactStore> {
    let config = PublishConfig::new(dir.path(), "org").with_push(true, true);
    let tracker = ModelTracker::start("hf", "pretrained=org/model,dtype=bfloat16");
    EvalPublisher::new(config, tracker, store)
}

fn stored(store: &MemoryArtifactStore, path: &str) -> Vec<u8> {
    store.get(&ArtifactPath::try_from(path).unwrap()).unwrap()
}

#[test]
fn full_session_publishes_results_samples_and_card() {
    let dir = tempfile::tempdir().unwrap();
    let mut publisher = publisher(&dir, Some(MemoryArtifactStore::new()));
    let samples = samples();

    let results_file = publisher
        .save_results_aggregated(&run(), results(), Some(&samples))
        .unwrap()
        .unwrap();
    assert_eq!(
        results_file,
        dir.path().join("org__model").join("results_2024-01-01T00-00-00.000001.json")
    );

    let written: Value = serde_json::from_str(&fs::read_to_string(&results_file).unwrap()).unwrap();
    let expected_hash = compute_task_fingerprint(&[
        SampleHashes::new("d-2+2", "p-2+2", "t-4"),
        SampleHashes::new("d-1+3", "p-1+3", "t-4"),
    ]);
    assert_eq!(written["task_hashes"]["gsm8k"], expected_hash);
    assert_eq!(written["model_name"], "org/model");
    assert_eq!(written["model_name_sanitized"], "org__model");
    assert!(written["total_evaluation_time_seconds"].is_string());
    assert_eq!(written["config"]["batch_size"], 1);

    publisher
        .save_results_samples(&run(), "gsm8k", &samples["gsm8k"])
        .unwrap();

    let store = publisher.store().unwrap();
    let uploaded: Value = serde_json::from_slice(&stored(store, RESULTS_PATH)).unwrap();
    assert_eq!(uploaded, written);

    let jsonl = String::from_utf8(stored(store, SAMPLES_PATH)).unwrap();
    let first: Value = serde_json::from_str(jsonl.lines().next().unwrap()).unwrap();
    assert_eq!(first["arguments"]["gen_args_0"]["arg_0"], "Q: 2+2\nA:");
    assert_eq!(first["arguments"]["gen_args_0"]["arg_1"]["until"][0], "\n");
    assert_eq!(first["resps"], json!([[["4", "false"]]]));
    assert_eq!(jsonl.lines().count(), 2);

    let card = DatasetCard::parse(&String::from_utf8(stored(store, CARD_PATH)).unwrap()).unwrap();
    let names: Vec<_> = card
        .header
        .configs
        .iter()
        .map(|c| c.config_name.as_str())
        .collect();
    assert_eq!(names, vec!["gsm8k", "results"]);
    let results_config = &card.header.configs[1];
    let latest = results_config
        .data_files
        .iter()
        .find(|d| d.split == LATEST_SPLIT)
        .unwrap();
    assert_eq!(latest.path, vec!["**/results_2024-01-01T00-00-00.000001.json"]);
    assert!(card
        .header
        .dataset_summary
        .contains("\"exact_match,strict-match\": 0.5"));
}

#[test]
fn missing_output_path_skips_everything() {
    let dir = tempfile::tempdir().unwrap();
    let config = PublishConfig {
        output_path: None,
        ..PublishConfig::new(dir.path(), "org").with_push(true, true)
    };
    let tracker = ModelTracker::start("hf", "pretrained=org/model");
    let mut publisher = EvalPublisher::new(config, tracker, Some(MemoryArtifactStore::new()));

    assert!(publisher
        .save_results_aggregated(&run(), results(), None)
        .unwrap()
        .is_none());
    assert!(publisher
        .save_results_samples(&run(), "gsm8k", &samples()["gsm8k"])
        .unwrap()
        .is_none());
    assert!(publisher.store().unwrap().is_empty());
    // The end time is still recorded.
    assert!(publisher.tracker().ended_at.is_some());
}

#[test]
fn upload_failures_do_not_fail_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut publisher = publisher(&dir, Some(MemoryArtifactStore::new()));
    publisher.store().unwrap().set_fail_puts(true);

    let local = publisher
        .save_results_aggregated(&run(), results(), Some(&samples()))
        .unwrap()
        .unwrap();
    assert!(local.exists());

    let local = publisher
        .save_results_samples(&run(), "gsm8k", &samples()["gsm8k"])
        .unwrap()
        .unwrap();
    assert!(local.exists());
    assert!(publisher.store().unwrap().is_empty());
}

#[test]
fn malformed_remote_artifact_fails_card_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryArtifactStore::with_paths(["other__model/samples_broken.json"]).unwrap();
    let publisher = publisher(&dir, Some(store));

    publisher
        .save_results_samples(&run(), "gsm8k", &samples()["gsm8k"])
        .unwrap()
        .unwrap();
    let store = publisher.store().unwrap();
    assert!(!stored(store, SAMPLES_PATH).is_empty());
    assert!(store.get(&ArtifactPath::try_from(CARD_PATH).unwrap()).is_err());

    let err = publisher.recreate_card().unwrap_err();
    assert!(matches!(err, EvalHubError::MalformedFilename { .. }));
}

#[test]
fn unreadable_latest_results_do_not_abort_samples_publishing() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryArtifactStore::new();
    store
        .put(&ArtifactPath::try_from(RESULTS_PATH).unwrap(), br#"{"config": {}}"#)
        .unwrap();
    let publisher = publisher(&dir, Some(store));
    let samples = samples();

    for task_samples in [&samples["gsm8k"][..1], &samples["gsm8k"][1..]] {
        let local = publisher
            .save_results_samples(&run(), "gsm8k", task_samples)
            .unwrap();
        assert!(local.is_some());
    }

    let store = publisher.store().unwrap();
    let jsonl = String::from_utf8(stored(store, SAMPLES_PATH)).unwrap();
    assert_eq!(jsonl.lines().count(), 2);
    assert!(store.get(&ArtifactPath::try_from(CARD_PATH).unwrap()).is_err());
    assert!(matches!(
        publisher.recreate_card(),
        Err(EvalHubError::InvalidResultsDocument(_))
    ));
}

#[test]
fn card_is_not_returned_when_its_upload_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryArtifactStore::new();
    for path in [RESULTS_PATH, SAMPLES_PATH] {
        store
            .put(
                &ArtifactPath::try_from(path).unwrap(),
                br#"{"results": {"gsm8k": {"acc": 0.5}}}"#,
            )
            .unwrap();
    }
    store.set_fail_puts(true);
    let publisher = publisher(&dir, Some(store));

    assert!(publisher.recreate_card().unwrap().is_none());
    let store = publisher.store().unwrap();
    assert!(store.get(&ArtifactPath::try_from(CARD_PATH).unwrap()).is_err());

    store.set_fail_puts(false);
    assert!(publisher.recreate_card().unwrap().is_some());
    assert!(!stored(store, CARD_PATH).is_empty());
}

#[test]
fn samples_of_one_run_are_appended() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = publisher(&dir, None);
    let samples = samples();

    publisher
        .save_results_samples(&run(), "gsm8k", &samples["gsm8k"][..1])
        .unwrap();
    let local = publisher
        .save_results_samples(&run(), "gsm8k", &samples["gsm8k"][1..])
        .unwrap()
        .unwrap();
    assert_eq!(fs::read_to_string(local).unwrap().lines().count(), 2);
}

#[test]
fn sample_missing_required_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = publisher(&dir, None);
    let mut broken = sample("2+2");
    broken.as_object_mut().unwrap().remove("filtered_resps");

    let err = publisher
        .save_results_samples(&run(), "gsm8k", &[broken])
        .unwrap_err();
    assert!(matches!(
        err,
        EvalHubError::MissingSampleField { ref field, .. } if field == "filtered_resps"
    ));
}

#[test]
fn non_object_results_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut publisher = publisher(&dir, None);
    let err = publisher
        .save_results_aggregated(&run(), json!([1, 2]), None)
        .unwrap_err();
    assert!(matches!(err, EvalHubError::InvalidResultsDocument(_)));
}

#[test]
fn card_needs_a_store() {
    let dir = tempfile::tempdir().unwrap();
    assert!(publisher(&dir, None).recreate_card().unwrap().is_none());
}

#[test]
fn card_can_be_recreated_from_existing_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryArtifactStore::new();
    for (path, body) in [
        (
            "org__model/results_2024-01-01T00-00-00.json",
            r#"{"results": {"arc_easy": {"acc": 0.25}}}"#,
        ),
        (
            "org__model/results_2024-01-02T00-00-00.json",
            r#"{"results": {"arc_easy": {"acc": 0.75}}}"#,
        ),
        ("org__model/samples_arc_easy_2024-01-01T00-00-00.json", ""),
        ("org__model/samples_arc_easy_2024-01-02T00-00-00.json", ""),
    ] {
        store
            .put(&ArtifactPath::try_from(path).unwrap(), body.as_bytes())
            .unwrap();
    }

    let card = publisher(&dir, Some(store)).recreate_card().unwrap().unwrap();
    let summary = &card.header.dataset_summary;
    assert!(summary.contains("created from 2 run(s)"));
    assert!(summary.contains("latest results from run 2024-01-02T00-00-00"));
    assert!(summary.contains("\"acc\": 0.75"));
}
