//! EvalHub Core Library
//!
//! Publishes evaluation run artifacts to an artifact store and rebuilds the
//! config/split catalog describing them from nothing but the store listing.

pub mod card;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod filename;
pub mod fingerprint;
pub mod metrics;
pub mod obs;
pub mod publish;
pub mod sanitize;
pub mod telemetry;

pub use card::{
    build_description, config_entries, render_metric_table, CardContext, CardHeader, ConfigEntry,
    DataFiles, DatasetCard, LatestResults, ResultsDocument,
};
pub use catalog::{
    Catalog, CatalogBuilder, CatalogOptions, Config, LatestTimestamps, PathStyle,
    ResultsLatestRule, Split, LATEST_SPLIT, RESULTS_CONFIG,
};
pub use config::PublishConfig;
pub use domain::{EvalHubError, ModelTracker, Result, RunId};
pub use filename::{
    parse_result_filename, parse_sample_filename, result_filename, sample_filename,
    sanitize_config_name, sanitize_split_name, ArtifactListing, ResultArtifact, SampleArtifact,
};
pub use fingerprint::{compute_task_fingerprint, hash_string, task_fingerprints, SampleHashes};
pub use publish::{assemble_card, load_latest_results, load_snapshot, EvalPublisher, CARD_PATH};
pub use sanitize::{prepare_sample, sanitize, sanitize_serialize};

pub use metrics::METRICS;
pub use obs::PublishSpan;
pub use telemetry::init_tracing;

/// EvalHub version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
