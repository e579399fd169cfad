//! Stateless catalog reconstruction from a store listing.
//!
//! The builder is a pure function of the listing snapshot it is given:
//!
//! 1. per-task latest timestamp = max of that task's sample timestamps
//! 2. results latest timestamp = max of the per-task latest values
//!    (or of the result-file timestamps, see [`ResultsLatestRule`])
//! 3. every result artifact goes into `results/<timestamp>`, and into
//!    `results/latest` when its timestamp is the results latest
//! 4. every sample artifact goes into `<task>/<timestamp>`, and into
//!    `<task>/latest` when its timestamp is the task latest
//! 5. samples whose task name contains a composite family prefix are also
//!    upserted into `<prefix>/<timestamp>` and `<prefix>/latest`
//!
//! Timestamps compare as strings; the fixed-width encoding makes string
//! order equal to time order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, LATEST_SPLIT, RESULTS_CONFIG};
use crate::domain::Result;
use crate::filename::{sanitize_config_name, sanitize_split_name, ArtifactListing, ResultArtifact};
use crate::metrics::METRICS;
use crate::obs;

/// Benchmark families that span many sub-tasks and get one merged config.
/// Matched as substrings of the sanitized task name; the trailing `_` keeps a
/// bare `math` task out of the `math_` family.
pub const DEFAULT_COMPOSITE_PREFIXES: [&str; 3] = ["mmlu_", "gpqa_", "math_"];

/// How artifact paths are written into splits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    /// `**/<basename>`: a glob that matches the file under any model directory.
    #[default]
    Glob,
    /// The full path as listed by the store.
    RepoPath,
}

/// Which timestamp marks the `latest` split of the results config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsLatestRule {
    /// Maximum of the per-task latest sample timestamps.
    #[default]
    TaskDerived,
    /// Maximum of the result-file timestamps.
    NewestResultFile,
}

/// Catalog construction options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOptions {
    pub composite_prefixes: Vec<String>,
    pub path_style: PathStyle,
    pub results_latest: ResultsLatestRule,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            composite_prefixes: DEFAULT_COMPOSITE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            path_style: PathStyle::default(),
            results_latest: ResultsLatestRule::default(),
        }
    }
}

impl CatalogOptions {
    /// Replace the composite family prefixes.
    pub fn with_composite_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.composite_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_path_style(mut self, style: PathStyle) -> Self {
        self.path_style = style;
        self
    }

    pub fn with_results_latest(mut self, rule: ResultsLatestRule) -> Self {
        self.results_latest = rule;
        self
    }
}

/// Latest timestamps derived from one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestTimestamps {
    /// Raw task name -> maximum sample timestamp.
    pub per_task: BTreeMap<String, String>,
    /// Timestamp of the results `latest` split; `None` when undefined.
    pub results: Option<String>,
}

impl LatestTimestamps {
    pub fn compute(listing: &ArtifactListing, rule: ResultsLatestRule) -> Self {
        let mut per_task: BTreeMap<String, String> = BTreeMap::new();
        for sample in &listing.samples {
            per_task
                .entry(sample.task_name.clone())
                .and_modify(|latest| {
                    if sample.timestamp > *latest {
                        *latest = sample.timestamp.clone();
                    }
                })
                .or_insert_with(|| sample.timestamp.clone());
        }

        let results = match rule {
            ResultsLatestRule::TaskDerived => per_task.values().max().cloned(),
            ResultsLatestRule::NewestResultFile => {
                listing.results.iter().map(|r| &r.timestamp).max().cloned()
            }
        };
        Self { per_task, results }
    }

    pub fn task(&self, task: &str) -> Option<&str> {
        self.per_task.get(task).map(String::as_str)
    }
}

/// Builds a [`Catalog`] from an [`ArtifactListing`]. Holds only options.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    options: CatalogOptions,
}

impl CatalogBuilder {
    pub fn new(options: CatalogOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    pub fn latest_timestamps(&self, listing: &ArtifactListing) -> LatestTimestamps {
        LatestTimestamps::compute(listing, self.options.results_latest)
    }

    /// The result artifact the results `latest` split points at: the first
    /// one in listing order carrying the results latest timestamp.
    pub fn latest_result<'a>(&self, listing: &'a ArtifactListing) -> Option<&'a ResultArtifact> {
        let latest = self.latest_timestamps(listing).results?;
        listing.results.iter().find(|r| r.timestamp == latest)
    }

    /// Parse raw listing paths and build the catalog.
    pub fn build_from_paths<I, P>(&self, paths: I) -> Result<Catalog>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let listing = ArtifactListing::from_paths(paths)?;
        Ok(self.build(&listing))
    }

    /// Build the full catalog for one listing snapshot.
    pub fn build(&self, listing: &ArtifactListing) -> Catalog {
        let latest = self.latest_timestamps(listing);
        let mut catalog = Catalog::new();

        // An empty results set still yields the (empty) results config.
        catalog.config_mut(RESULTS_CONFIG);
        for result in &listing.results {
            let path = self.catalog_path(&result.repo_path);
            catalog.upsert(RESULTS_CONFIG, &sanitize_split_name(&result.timestamp), &path);
            if latest.results.as_deref() == Some(result.timestamp.as_str()) {
                catalog.upsert(RESULTS_CONFIG, LATEST_SPLIT, &path);
            }
        }

        for sample in &listing.samples {
            let path = self.catalog_path(&sample.repo_path);
            let config = sanitize_config_name(&sample.task_name);
            let split = sanitize_split_name(&sample.timestamp);
            let is_latest = latest.task(&sample.task_name) == Some(sample.timestamp.as_str());

            catalog.upsert(&config, &split, &path);
            if is_latest {
                catalog.upsert(&config, LATEST_SPLIT, &path);
            }

            for prefix in &self.options.composite_prefixes {
                if !config.contains(prefix.as_str()) {
                    continue;
                }
                catalog.upsert(prefix, &split, &path);
                if is_latest {
                    catalog.upsert(prefix, LATEST_SPLIT, &path);
                }
            }
        }

        debug!(
            results = listing.results.len(),
            samples = listing.samples.len(),
            tasks = latest.per_task.len(),
            results_latest = latest.results.as_deref().unwrap_or("<none>"),
            "catalog reconstructed"
        );
        obs::emit_catalog_built(catalog.len(), listing.results.len(), listing.samples.len());
        METRICS.inc_catalogs_built();
        catalog
    }

    fn catalog_path(&self, repo_path: &str) -> String {
        match self.options.path_style {
            PathStyle::RepoPath => repo_path.to_string(),
            PathStyle::Glob => {
                let basename = repo_path.rsplit('/').next().unwrap_or(repo_path);
                format!("**/{basename}")
            }
        }
    }
}
