//! Publish-session driver.
//!
//! One session publishes, in order: the aggregated results of a run, the
//! sample dump of each task, and finally the rebuilt dataset card. Every
//! artifact name embeds the explicit [`RunId`] handed to each call.
//!
//! Local writes and malformed store contents are errors. Transport failures
//! talking to the store are logged and counted but do not fail the call:
//! publishing is best-effort and the whole cycle can simply be re-run.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use evalhub_store::{ArtifactPath, ArtifactStore};
use serde_json::Value;
use tracing::debug;

use crate::card::{build_description, CardContext, DatasetCard, LatestResults, ResultsDocument};
use crate::catalog::{Catalog, CatalogBuilder};
use crate::config::PublishConfig;
use crate::domain::{EvalHubError, ModelTracker, Result, RunId};
use crate::filename::{result_filename, sample_filename, ArtifactListing};
use crate::fingerprint::task_fingerprints;
use crate::metrics::METRICS;
use crate::obs::{self, PublishSpan};
use crate::sanitize::encode_samples_jsonl;

/// Store path of the dataset card.
pub const CARD_PATH: &str = "README.md";

/// Parse the current store listing into artifacts.
pub fn load_snapshot<S: ArtifactStore + ?Sized>(store: &S) -> Result<ArtifactListing> {
    let paths = store.list("")?;
    ArtifactListing::from_store_listing(&paths)
}

/// Fetch the results document the results `latest` split points at.
pub fn load_latest_results<S: ArtifactStore + ?Sized>(
    store: &S,
    builder: &CatalogBuilder,
    listing: &ArtifactListing,
) -> Result<Option<LatestResults>> {
    let Some(artifact) = builder.latest_result(listing) else {
        return Ok(None);
    };
    let path = ArtifactPath::try_from(artifact.repo_path.as_str())?;
    let document = ResultsDocument::from_slice(&store.get(&path)?)?;
    Ok(Some(LatestResults {
        timestamp: artifact.timestamp.clone(),
        repo_path: artifact.repo_path.clone(),
        document,
    }))
}

/// Rebuild the catalog from the store and assemble the card for it.
pub fn assemble_card<S: ArtifactStore + ?Sized>(
    store: &S,
    builder: &CatalogBuilder,
    ctx: &CardContext,
) -> Result<(Catalog, DatasetCard)> {
    let listing = load_snapshot(store)?;
    let catalog = builder.build(&listing);
    let latest = load_latest_results(store, builder, &listing)?;
    let card = build_description(&catalog, latest.as_ref(), ctx)?;
    Ok((catalog, card))
}

/// Saves evaluation artifacts locally and publishes them to a store.
pub struct EvalPublisher<S> {
    config: PublishConfig,
    tracker: ModelTracker,
    store: Option<S>,
    builder: CatalogBuilder,
}

impl<S: ArtifactStore> EvalPublisher<S> {
    /// Without a store, artifacts are only written locally.
    pub fn new(config: PublishConfig, tracker: ModelTracker, store: Option<S>) -> Self {
        let builder = CatalogBuilder::new(config.catalog.clone());
        Self {
            config,
            tracker,
            store,
            builder,
        }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ModelTracker {
        &self.tracker
    }

    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }

    fn model_dir(&self) -> Option<PathBuf> {
        self.config
            .output_path
            .as_ref()
            .map(|root| root.join(&self.tracker.model_name_sanitized))
    }

    fn remote_path(&self, filename: &str) -> Result<ArtifactPath> {
        let dir = &self.tracker.model_name_sanitized;
        let path = if dir.is_empty() {
            filename.to_string()
        } else {
            format!("{dir}/{filename}")
        };
        Ok(ArtifactPath::try_from(path)?)
    }

    /// Upload `data`; transport failures are logged and reported as `false`.
    fn upload(&self, store: &S, path: &ArtifactPath, data: &[u8]) -> bool {
        match store.put(path, data) {
            Ok(()) => {
                obs::emit_artifact_uploaded(path.as_str(), data.len());
                METRICS.inc_artifacts_uploaded();
                true
            }
            Err(e) => {
                obs::emit_upload_failed(path.as_str(), &e);
                METRICS.inc_upload_failures();
                false
            }
        }
    }

    /// Write `results_<run>.json` and push it when configured.
    ///
    /// The document gains `task_hashes` (one fingerprint per task in
    /// `samples`) and the tracker fields. Returns the local path written.
    pub fn save_results_aggregated(
        &mut self,
        run: &RunId,
        results: Value,
        samples: Option<&BTreeMap<String, Vec<Value>>>,
    ) -> Result<Option<PathBuf>> {
        let _span = PublishSpan::enter(run.as_str(), "results");
        self.tracker.log_end_time();

        let Some(dir) = self.model_dir() else {
            obs::emit_publish_skipped("results", "output path not provided");
            return Ok(None);
        };

        let Value::Object(mut document) = results else {
            return Err(EvalHubError::InvalidResultsDocument(
                "aggregated results must be a JSON object".to_string(),
            ));
        };
        let task_hashes = match samples {
            Some(samples) => task_fingerprints(samples)?,
            None => BTreeMap::new(),
        };
        document.insert("task_hashes".to_string(), serde_json::to_value(&task_hashes)?);
        if let Value::Object(tracker_fields) = serde_json::to_value(&self.tracker)? {
            document.extend(tracker_fields);
        }
        let dumped = serde_json::to_string_pretty(&Value::Object(document))?;

        fs::create_dir_all(&dir)?;
        let filename = result_filename(run);
        let local = dir.join(&filename);
        fs::write(&local, &dumped)?;
        obs::emit_results_saved(run.as_str(), &local.display().to_string(), task_hashes.len());

        if self.config.push_results_to_hub {
            if let Some(store) = &self.store {
                let remote = self.remote_path(&filename)?;
                self.upload(store, &remote, dumped.as_bytes());
            }
        }
        Ok(Some(local))
    }

    /// Append the prepared samples of `task` to `samples_<task>_<run>.json`,
    /// push the file and rebuild the card when configured. A failed card
    /// rebuild is logged and does not fail the call.
    pub fn save_results_samples(
        &self,
        run: &RunId,
        task: &str,
        samples: &[Value],
    ) -> Result<Option<PathBuf>> {
        let _span = PublishSpan::enter(run.as_str(), "samples");
        let Some(dir) = self.model_dir() else {
            obs::emit_publish_skipped("samples", "output path not provided");
            return Ok(None);
        };

        let encoded = encode_samples_jsonl(task, samples)?;
        fs::create_dir_all(&dir)?;
        let filename = sample_filename(task, run);
        let local = dir.join(&filename);
        let mut file = OpenOptions::new().create(true).append(true).open(&local)?;
        file.write_all(encoded.as_bytes())?;
        obs::emit_samples_saved(run.as_str(), task, &local.display().to_string(), samples.len());

        if self.config.push_samples_to_hub {
            if let Some(store) = &self.store {
                let remote = self.remote_path(&filename)?;
                let contents = fs::read(&local)?;
                if self.upload(store, &remote, &contents) {
                    if let Err(e) = self.recreate_card() {
                        obs::emit_card_rebuild_failed(&e);
                        METRICS.inc_upload_failures();
                    }
                }
            }
        }
        Ok(Some(local))
    }

    /// Rebuild the catalog from the store listing and publish the card.
    ///
    /// Returns the card only once it has been uploaded. `None` means no
    /// store is attached, the listing could not be fetched, or the card
    /// upload failed. Malformed artifact names in the listing are errors.
    pub fn recreate_card(&self) -> Result<Option<DatasetCard>> {
        let Some(store) = &self.store else {
            obs::emit_publish_skipped("card", "no artifact store attached");
            return Ok(None);
        };
        let ctx = CardContext::new(
            &self.config.repo_id(),
            &self.tracker.model_name,
            &self.tracker.model_source,
        )
        .with_hub_endpoint(&self.config.hub_endpoint);

        let (catalog, card) = match assemble_card(store, &self.builder, &ctx) {
            Ok(assembled) => assembled,
            Err(EvalHubError::Storage(e)) if e.is_transport() => {
                obs::emit_upload_failed(CARD_PATH, &e);
                METRICS.inc_upload_failures();
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        debug!(configs = catalog.len(), runs = catalog.run_count(), "card assembled");

        let rendered = card.render()?;
        if self.upload(store, &ArtifactPath::try_from(CARD_PATH)?, rendered.as_bytes()) {
            obs::emit_card_published(&ctx.repo_id, catalog.len(), catalog.run_count());
            METRICS.inc_cards_published();
            Ok(Some(card))
        } else {
            Ok(None)
        }
    }
}
