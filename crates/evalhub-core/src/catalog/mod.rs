//! Config/Split catalog of published artifacts.
//!
//! A [`Catalog`] maps config names to [`Config`]s; each config holds an
//! ordered list of named [`Split`]s; each split holds an ordered,
//! duplicate-free list of artifact paths. All mutation goes through
//! create-or-append upserts, so the same path is never recorded twice in a
//! split no matter how often it is added.

pub mod builder;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use builder::{
    CatalogBuilder, CatalogOptions, LatestTimestamps, PathStyle, ResultsLatestRule,
    DEFAULT_COMPOSITE_PREFIXES,
};

/// Reserved config holding the aggregated-results artifacts.
pub const RESULTS_CONFIG: &str = "results";

/// Reserved split pointing at the most recent artifacts of a config.
pub const LATEST_SPLIT: &str = "latest";

/// Named, ordered, duplicate-free bucket of artifact paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub name: String,
    pub paths: Vec<String>,
}

impl Split {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            paths: Vec::new(),
        }
    }

    /// Append `path` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, path: &str) -> bool {
        if self.paths.iter().any(|p| p == path) {
            return false;
        }
        self.paths.push(path.to_string());
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

/// Named grouping of splits, kept in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub splits: Vec<Split>,
}

impl Config {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            splits: Vec::new(),
        }
    }

    pub fn split(&self, name: &str) -> Option<&Split> {
        self.splits.iter().find(|s| s.name == name)
    }

    /// Locate the split called `name`, creating it at the end if missing.
    pub fn split_mut(&mut self, name: &str) -> &mut Split {
        match self.splits.iter().position(|s| s.name == name) {
            Some(idx) => &mut self.splits[idx],
            None => {
                self.splits.push(Split::new(name));
                let last = self.splits.len() - 1;
                &mut self.splits[last]
            }
        }
    }

    /// Create-or-append `path` into split `split`.
    pub fn upsert(&mut self, split: &str, path: &str) -> bool {
        self.split_mut(split).push(path)
    }

    pub fn latest(&self) -> Option<&Split> {
        self.split(LATEST_SPLIT)
    }

    /// Splits other than `latest`, i.e. one per run.
    pub fn run_splits(&self) -> impl Iterator<Item = &Split> {
        self.splits.iter().filter(|s| s.name != LATEST_SPLIT)
    }

    pub fn is_empty(&self) -> bool {
        self.splits.iter().all(|s| s.paths.is_empty())
    }
}

/// The complete derived structure: every config keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub configs: BTreeMap<String, Config>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self, name: &str) -> Option<&Config> {
        self.configs.get(name)
    }

    /// Locate the config called `name`, creating it if missing.
    pub fn config_mut(&mut self, name: &str) -> &mut Config {
        self.configs
            .entry(name.to_string())
            .or_insert_with(|| Config::new(name))
    }

    /// Create-or-append `path` into `config`/`split`.
    pub fn upsert(&mut self, config: &str, split: &str, path: &str) -> bool {
        self.config_mut(config).upsert(split, path)
    }

    /// Upsert every path of `other` into `self`, preserving `other`'s order
    /// for paths not already present.
    pub fn merge(&mut self, other: &Catalog) {
        for (name, config) in &other.configs {
            let target = self.config_mut(name);
            for split in &config.splits {
                let dest = target.split_mut(&split.name);
                for path in &split.paths {
                    dest.push(path);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Number of runs, counted as the non-`latest` splits of the results config.
    pub fn run_count(&self) -> usize {
        self.config(RESULTS_CONFIG)
            .map(|c| c.run_splits().count())
            .unwrap_or(0)
    }

    /// Number of configs other than the reserved results config.
    pub fn task_config_count(&self) -> usize {
        self.configs
            .keys()
            .filter(|name| name.as_str() != RESULTS_CONFIG)
            .count()
    }
}
