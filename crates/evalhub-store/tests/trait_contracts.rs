//! Trait contract tests for ArtifactStore.
//!
//! Every conforming implementation must pass the same checks; each test runs
//! against both the in-memory fake and the filesystem store.

use evalhub_store::{
    ArtifactPath, ArtifactStore, FsArtifactStore, MemoryArtifactStore, StorageError,
};

fn path(p: &str) -> ArtifactPath {
    ArtifactPath::try_from(p).unwrap()
}

fn with_stores(check: impl Fn(&dyn ArtifactStore)) {
    let memory = MemoryArtifactStore::new();
    check(&memory);

    let dir = tempfile::tempdir().unwrap();
    let fs_store = FsArtifactStore::new(dir.path()).unwrap();
    check(&fs_store);
}

// ===========================================================================
// ArtifactStore contract tests
// ===========================================================================

#[test]
fn put_then_get_round_trip() {
    with_stores(|store| {
        let p = path("org__model/results_2024-01-01T00-00-00.json");
        store.put(&p, b"payload").unwrap();
        assert_eq!(store.get(&p).unwrap(), b"payload");
    });
}

#[test]
fn get_missing_is_not_found() {
    with_stores(|store| {
        let err = store.get(&path("missing.json")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    });
}

#[test]
fn list_is_ordered_and_unique() {
    with_stores(|store| {
        for p in [
            "m/samples_gsm8k_2024-01-02T00-00-00.json",
            "m/results_2024-01-02T00-00-00.json",
            "m/results_2024-01-01T00-00-00.json",
            "m/results_2024-01-01T00-00-00.json",
        ] {
            store.put(&path(p), b"{}").unwrap();
        }
        let listed = store.list("").unwrap();
        assert_eq!(
            listed,
            vec![
                path("m/results_2024-01-01T00-00-00.json"),
                path("m/results_2024-01-02T00-00-00.json"),
                path("m/samples_gsm8k_2024-01-02T00-00-00.json"),
            ]
        );
    });
}

#[test]
fn list_respects_prefix() {
    with_stores(|store| {
        store.put(&path("a/results_t.json"), b"").unwrap();
        store.put(&path("b/results_t.json"), b"").unwrap();
        assert_eq!(store.list("a/").unwrap(), vec![path("a/results_t.json")]);
        assert!(store.list("c/").unwrap().is_empty());
    });
}

#[test]
fn memory_store_failure_injection() {
    let store = MemoryArtifactStore::new();
    store.set_fail_puts(true);
    let err = store.put(&path("README.md"), b"card").unwrap_err();
    assert!(err.is_transport());
    assert!(store.is_empty());

    store.set_fail_puts(false);
    store.put(&path("README.md"), b"card").unwrap();
    assert_eq!(store.len(), 1);
}

#[test]
fn memory_store_seeding() {
    let store = MemoryArtifactStore::with_paths(["m/results_a.json", "m/results_b.json"]).unwrap();
    assert_eq!(store.list("m/").unwrap().len(), 2);
    assert!(MemoryArtifactStore::with_paths(["/abs"]).is_err());
}
