//! Per-task content fingerprints.
//!
//! A task fingerprint is the SHA-256 hex digest of the concatenation, in
//! sample order, of every sample's `doc_hash + prompt_hash + target_hash`.
//! Two runs of a task share a fingerprint iff they evaluated the same
//! documents with the same prompts and targets in the same order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::{EvalHubError, Result};

/// Hashes identifying one evaluated sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleHashes {
    pub doc_hash: String,
    pub prompt_hash: String,
    pub target_hash: String,
}

impl SampleHashes {
    pub fn new(doc_hash: &str, prompt_hash: &str, target_hash: &str) -> Self {
        Self {
            doc_hash: doc_hash.to_string(),
            prompt_hash: prompt_hash.to_string(),
            target_hash: target_hash.to_string(),
        }
    }

    /// Read the three hash fields out of a sample record.
    pub fn from_sample(task: &str, index: usize, sample: &Value) -> Result<Self> {
        let field = |name: &str| -> Result<String> {
            sample
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| EvalHubError::MissingSampleField {
                    task: task.to_string(),
                    index,
                    field: name.to_string(),
                })
        };
        Ok(Self {
            doc_hash: field("doc_hash")?,
            prompt_hash: field("prompt_hash")?,
            target_hash: field("target_hash")?,
        })
    }
}

/// SHA-256 hex digest of a UTF-8 string.
pub fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of an ordered sequence of sample hashes.
pub fn compute_task_fingerprint(samples: &[SampleHashes]) -> String {
    let concatenated: String = samples
        .iter()
        .map(|s| format!("{}{}{}", s.doc_hash, s.prompt_hash, s.target_hash))
        .collect();
    hash_string(&concatenated)
}

/// Fingerprint of every task in a `task -> samples` map.
pub fn task_fingerprints(samples: &BTreeMap<String, Vec<Value>>) -> Result<BTreeMap<String, String>> {
    samples
        .iter()
        .map(|(task, task_samples)| {
            let hashes = task_samples
                .iter()
                .enumerate()
                .map(|(i, s)| SampleHashes::from_sample(task, i, s))
                .collect::<Result<Vec<_>>>()?;
            Ok((task.clone(), compute_task_fingerprint(&hashes)))
        })
        .collect()
}
