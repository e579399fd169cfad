//! Every workspace crate inherits the workspace version, and internal path
//! dependencies are pinned to that same version.

use std::path::{Path, PathBuf};

const MEMBERS: [&str; 3] = [
    "crates/evalhub-core",
    "crates/evalhub-cli",
    "crates/evalhub-store",
];

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .unwrap()
        .to_path_buf()
}

fn manifest(dir: &Path) -> toml::Value {
    let path = dir.join("Cargo.toml");
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
        .parse()
        .unwrap()
}

fn workspace_version() -> String {
    manifest(&workspace_root())["workspace"]["package"]["version"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test]
fn members_inherit_workspace_version() {
    let root = workspace_root();
    for member in MEMBERS {
        let doc = manifest(&root.join(member));
        let inherits = doc["package"]
            .get("version")
            .and_then(|v| v.get("workspace"))
            .and_then(toml::Value::as_bool);
        assert_eq!(
            inherits,
            Some(true),
            "{member} should use version.workspace = true"
        );
    }
}

#[test]
fn members_are_listed_in_workspace() {
    let doc = manifest(&workspace_root());
    let listed: Vec<&str> = doc["workspace"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(toml::Value::as_str)
        .collect();
    for member in MEMBERS {
        assert!(listed.contains(&member), "{member} missing from workspace members");
    }
}

#[test]
fn internal_path_deps_pin_workspace_version() {
    let ws_version = workspace_version();
    let doc = manifest(&workspace_root());
    let deps = doc["workspace"]["dependencies"].as_table().unwrap();
    for name in ["evalhub-core", "evalhub-store"] {
        let pinned = deps[name]["version"].as_str().unwrap();
        assert_eq!(
            pinned, ws_version,
            "{name} is pinned to {pinned} but the workspace is at {ws_version}"
        );
    }
}

#[test]
fn workspace_version_matches_cargo_pkg() {
    assert_eq!(workspace_version(), env!("CARGO_PKG_VERSION"));
    assert_eq!(evalhub_core::VERSION, env!("CARGO_PKG_VERSION"));
}
