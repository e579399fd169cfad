//! Artifact filename conventions.
//!
//! - aggregated results: `results_<timestamp>.json`
//! - per-task samples:   `samples_<task>_<timestamp>.json`
//!
//! Timestamps never contain `_`, so the task name of a sample file is
//! everything between the first and the last underscore.

use std::sync::OnceLock;

use evalhub_store::ArtifactPath;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{EvalHubError, Result, RunId};

pub const RESULTS_PREFIX: &str = "results_";
pub const SAMPLES_PREFIX: &str = "samples_";
pub const ARTIFACT_EXTENSION: &str = ".json";

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\W").expect("static regex"))
}

fn non_word_or_dot() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w.]").expect("static regex"))
}

/// Config name for a task: every non-word character becomes `_`.
pub fn sanitize_config_name(task: &str) -> String {
    non_word().replace_all(task, "_").into_owned()
}

/// Split name for a timestamp: every character other than a word character
/// or `.` becomes `_` (the fractional-seconds dot survives).
pub fn sanitize_split_name(timestamp: &str) -> String {
    non_word_or_dot().replace_all(timestamp, "_").into_owned()
}

/// Filename of the aggregated results for `run`.
pub fn result_filename(run: &RunId) -> String {
    format!("{RESULTS_PREFIX}{run}{ARTIFACT_EXTENSION}")
}

/// Filename of the sample dump of `task` for `run`.
pub fn sample_filename(task: &str, run: &RunId) -> String {
    format!("{SAMPLES_PREFIX}{task}_{run}{ARTIFACT_EXTENSION}")
}

fn malformed(filename: &str, reason: &str) -> EvalHubError {
    EvalHubError::MalformedFilename {
        filename: filename.to_string(),
        reason: reason.to_string(),
    }
}

fn strip_extension(filename: &str) -> Result<&str> {
    filename
        .strip_suffix(ARTIFACT_EXTENSION)
        .ok_or_else(|| malformed(filename, "missing .json extension"))
}

/// Timestamp of a `results_<timestamp>.json` filename: everything after the
/// first underscore up to the extension.
pub fn parse_result_filename(filename: &str) -> Result<String> {
    let stem = strip_extension(filename)?;
    let Some((_, timestamp)) = stem.split_once('_') else {
        return Err(malformed(filename, "missing '_' before timestamp"));
    };
    if timestamp.is_empty() {
        return Err(malformed(filename, "empty timestamp"));
    }
    Ok(timestamp.to_string())
}

/// `(task, timestamp)` of a `samples_<task>_<timestamp>.json` filename.
pub fn parse_sample_filename(filename: &str) -> Result<(String, String)> {
    let stem = strip_extension(filename)?;
    let (Some(first), Some(last)) = (stem.find('_'), stem.rfind('_')) else {
        return Err(malformed(filename, "missing '_' delimiters"));
    };
    if first == last {
        return Err(malformed(filename, "missing task name or timestamp"));
    }
    let task = &stem[first + 1..last];
    let timestamp = &stem[last + 1..];
    if task.is_empty() {
        return Err(malformed(filename, "empty task name"));
    }
    if timestamp.is_empty() {
        return Err(malformed(filename, "empty timestamp"));
    }
    Ok((task.to_string(), timestamp.to_string()))
}

// ---------------------------------------------------------------------------
// Parsed artifacts
// ---------------------------------------------------------------------------

/// One aggregated-results document in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultArtifact {
    pub repo_path: String,
    pub timestamp: String,
}

/// One per-task sample dump in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleArtifact {
    pub repo_path: String,
    pub task_name: String,
    pub timestamp: String,
}

/// Kind of a listing entry, decided by its basename prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListedArtifact {
    Result(ResultArtifact),
    Sample(SampleArtifact),
    /// README, attributes files and anything else that is not an artifact.
    Other,
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Classify and parse one listing path.
///
/// Paths whose basename starts with `results_`/`samples_` must match the
/// full pattern; anything else is `Other`.
pub fn classify(repo_path: &str) -> Result<ListedArtifact> {
    let name = basename(repo_path);
    if name.starts_with(RESULTS_PREFIX) {
        let timestamp = parse_result_filename(name)?;
        Ok(ListedArtifact::Result(ResultArtifact {
            repo_path: repo_path.to_string(),
            timestamp,
        }))
    } else if name.starts_with(SAMPLES_PREFIX) {
        let (task_name, timestamp) = parse_sample_filename(name)?;
        Ok(ListedArtifact::Sample(SampleArtifact {
            repo_path: repo_path.to_string(),
            task_name,
            timestamp,
        }))
    } else {
        Ok(ListedArtifact::Other)
    }
}

/// A parsed snapshot of the store listing, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactListing {
    pub results: Vec<ResultArtifact>,
    pub samples: Vec<SampleArtifact>,
}

impl ArtifactListing {
    /// Parse a listing of raw path strings. Fails on the first malformed
    /// artifact name.
    pub fn from_paths<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut listing = ArtifactListing::default();
        for path in paths {
            match classify(path.as_ref())? {
                ListedArtifact::Result(r) => listing.results.push(r),
                ListedArtifact::Sample(s) => listing.samples.push(s),
                ListedArtifact::Other => {}
            }
        }
        Ok(listing)
    }

    /// Parse a listing returned by an artifact store.
    pub fn from_store_listing(paths: &[ArtifactPath]) -> Result<Self> {
        Self::from_paths(paths.iter().map(ArtifactPath::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.samples.is_empty()
    }
}
