//! Publisher configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::card::DEFAULT_HUB_ENDPOINT;
use crate::catalog::CatalogOptions;

/// Repository name used when none is configured.
pub const DEFAULT_REPO_NAME: &str = "lm-eval-results";

/// Where and how evaluation artifacts are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Local directory results are written under; `None` disables saving.
    pub output_path: Option<PathBuf>,
    /// Hub organisation owning the results repository.
    pub hub_results_org: String,
    pub hub_repo_name: String,
    pub push_results_to_hub: bool,
    pub push_samples_to_hub: bool,
    /// Public repositories use `<org>/<name>`, private ones `<org>/<name>-private`.
    pub public_repo: bool,
    pub hub_endpoint: String,
    pub catalog: CatalogOptions,
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            output_path: std::env::var("EVALHUB_OUTPUT_PATH").ok().map(PathBuf::from),
            hub_results_org: std::env::var("EVALHUB_ORG").unwrap_or_default(),
            hub_repo_name: std::env::var("EVALHUB_REPO_NAME")
                .ok()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_REPO_NAME.to_string()),
            push_results_to_hub: false,
            push_samples_to_hub: false,
            public_repo: std::env::var("EVALHUB_PUBLIC")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            hub_endpoint: std::env::var("EVALHUB_HUB_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_HUB_ENDPOINT.to_string()),
            catalog: CatalogOptions::default(),
        }
    }
}

impl PublishConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a config writing to `output_path` for `org`
    pub fn new(output_path: impl Into<PathBuf>, org: &str) -> Self {
        PublishConfig {
            output_path: Some(output_path.into()),
            hub_results_org: org.to_string(),
            hub_repo_name: DEFAULT_REPO_NAME.to_string(),
            push_results_to_hub: false,
            push_samples_to_hub: false,
            public_repo: false,
            hub_endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
            catalog: CatalogOptions::default(),
        }
    }

    /// Set the repository name; an empty name keeps the default
    pub fn with_repo_name(mut self, name: &str) -> Self {
        if !name.is_empty() {
            self.hub_repo_name = name.to_string();
        }
        self
    }

    /// Enable pushing of aggregated results and/or samples
    pub fn with_push(mut self, results: bool, samples: bool) -> Self {
        self.push_results_to_hub = results;
        self.push_samples_to_hub = samples;
        self
    }

    pub fn with_public_repo(mut self, public: bool) -> Self {
        self.public_repo = public;
        self
    }

    pub fn with_catalog_options(mut self, options: CatalogOptions) -> Self {
        self.catalog = options;
        self
    }

    /// Repository the artifacts are published to.
    pub fn repo_id(&self) -> String {
        if self.public_repo {
            format!("{}/{}", self.hub_results_org, self.hub_repo_name)
        } else {
            format!("{}/{}-private", self.hub_results_org, self.hub_repo_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_id_private_suffix() {
        let config = PublishConfig::new("/tmp/out", "org");
        assert_eq!(config.repo_id(), "org/lm-eval-results-private");
        let config = config.with_public_repo(true).with_repo_name("evals");
        assert_eq!(config.repo_id(), "org/evals");
    }

    #[test]
    fn empty_repo_name_keeps_default() {
        let config = PublishConfig::new("/tmp/out", "org").with_repo_name("");
        assert_eq!(config.hub_repo_name, DEFAULT_REPO_NAME);
    }

    #[test]
    fn push_flags_default_off() {
        let config = PublishConfig::new("/tmp/out", "org");
        assert!(!config.push_results_to_hub);
        assert!(!config.push_samples_to_hub);
        let config = config.with_push(true, false);
        assert!(config.push_results_to_hub);
        assert!(!config.push_samples_to_hub);
    }
}
