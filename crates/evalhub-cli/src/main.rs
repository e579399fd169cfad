//! EvalHub CLI
//!
//! The `evalhub` command publishes evaluation artifacts and inspects the
//! catalog reconstructed from a store.
//!
//! ## Commands
//!
//! - `catalog`: Rebuild and print the config/split catalog of a store
//! - `card`: Assemble (and optionally publish) the dataset card of a store
//! - `publish`: Save a run's results and samples and push them to a store

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evalhub_core::{
    assemble_card, Catalog, CardContext, CatalogBuilder, CatalogOptions, EvalPublisher,
    ModelTracker, PathStyle, PublishConfig, ResultsLatestRule, RunId, CARD_PATH, METRICS,
};
use evalhub_store::{ArtifactPath, ArtifactStore, FsArtifactStore};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "evalhub")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluation artifact publishing and catalog reconstruction", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LatestRule {
    /// Newest per-task sample timestamp
    TaskDerived,
    /// Newest results file
    NewestResultFile,
}

impl From<LatestRule> for ResultsLatestRule {
    fn from(rule: LatestRule) -> Self {
        match rule {
            LatestRule::TaskDerived => ResultsLatestRule::TaskDerived,
            LatestRule::NewestResultFile => ResultsLatestRule::NewestResultFile,
        }
    }
}

#[derive(clap::Args)]
struct CatalogArgs {
    /// Which timestamp marks the results `latest` split
    #[arg(long, value_enum, default_value_t = LatestRule::TaskDerived)]
    results_latest: LatestRule,

    /// Record full store paths instead of `**/<basename>` globs
    #[arg(long)]
    repo_paths: bool,
}

impl CatalogArgs {
    fn options(&self) -> CatalogOptions {
        let style = if self.repo_paths {
            PathStyle::RepoPath
        } else {
            PathStyle::Glob
        };
        CatalogOptions::default()
            .with_results_latest(self.results_latest.into())
            .with_path_style(style)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the catalog from a store listing
    Catalog {
        /// Root directory of the artifact store
        #[arg(long)]
        store_dir: PathBuf,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Assemble the dataset card of a store
    Card {
        /// Root directory of the artifact store
        #[arg(long)]
        store_dir: PathBuf,

        /// Model name shown on the card
        #[arg(long)]
        model: String,

        /// Model source (`hf` renders hub links)
        #[arg(long, default_value = "hf")]
        model_source: String,

        /// Write the card to the store as README.md
        #[arg(long)]
        publish: bool,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Save one run's results and samples, pushing them when a store is given
    Publish {
        /// Aggregated results document (JSON)
        #[arg(long)]
        results: PathBuf,

        /// Samples per task (JSON object of task -> array of samples)
        #[arg(long)]
        samples: Option<PathBuf>,

        /// Comma-separated model arguments, e.g. `pretrained=org/model`
        #[arg(long)]
        model_args: String,

        #[arg(long, default_value = "hf")]
        model_source: String,

        /// Local directory to save artifacts under
        #[arg(long, env = "EVALHUB_OUTPUT_PATH")]
        output_path: PathBuf,

        /// Root directory of the artifact store to push to
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Run identifier (default: current local time)
        #[arg(long)]
        run_id: Option<String>,

        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    evalhub_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Catalog { store_dir, catalog } => cmd_catalog(&store_dir, &catalog, cli.json),
        Commands::Card {
            store_dir,
            model,
            model_source,
            publish,
            catalog,
        } => cmd_card(&store_dir, &model, &model_source, publish, &catalog),
        Commands::Publish {
            results,
            samples,
            model_args,
            model_source,
            output_path,
            store_dir,
            run_id,
            catalog,
        } => cmd_publish(
            &results,
            samples.as_deref(),
            &model_args,
            &model_source,
            &output_path,
            store_dir.as_deref(),
            run_id.as_deref(),
            &catalog,
        ),
    };
    METRICS.flush();
    result
}

fn open_store(dir: &Path) -> Result<FsArtifactStore> {
    FsArtifactStore::new(dir).with_context(|| format!("Failed to open artifact store {:?}", dir))
}

#[derive(Serialize)]
struct CatalogReport<'a> {
    configs: usize,
    task_configs: usize,
    runs: usize,
    catalog: &'a Catalog,
}

struct SplitSummary<'a> {
    config: &'a str,
    split: &'a str,
    paths: usize,
}

fn summarize(catalog: &Catalog) -> Vec<SplitSummary<'_>> {
    catalog
        .configs
        .values()
        .flat_map(|config| {
            config.splits.iter().map(move |split| SplitSummary {
                config: &config.name,
                split: &split.name,
                paths: split.paths.len(),
            })
        })
        .collect()
}

/// Rebuild and print the catalog of a store
fn cmd_catalog(store_dir: &Path, args: &CatalogArgs, json: bool) -> Result<()> {
    let store = open_store(store_dir)?;
    let catalog = CatalogBuilder::new(args.options())
        .build_from_paths(store.list("")?.iter().map(ArtifactPath::as_str))
        .context("Failed to rebuild catalog")?;

    if json {
        let report = CatalogReport {
            configs: catalog.len(),
            task_configs: catalog.task_config_count(),
            runs: catalog.run_count(),
            catalog: &catalog,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} config(s), {} run(s)",
        catalog.len(),
        catalog.run_count()
    );
    for row in summarize(&catalog) {
        println!("  {:<40} {:<32} {} path(s)", row.config, row.split, row.paths);
    }
    Ok(())
}

/// Assemble the dataset card and print or publish it
fn cmd_card(
    store_dir: &Path,
    model: &str,
    model_source: &str,
    publish: bool,
    args: &CatalogArgs,
) -> Result<()> {
    let store = open_store(store_dir)?;
    let config = PublishConfig::from_env();
    let ctx = CardContext::new(&config.repo_id(), model, model_source)
        .with_hub_endpoint(&config.hub_endpoint);
    let builder = CatalogBuilder::new(args.options());

    let (catalog, card) =
        assemble_card(&store, &builder, &ctx).context("Failed to assemble dataset card")?;
    let rendered = card.render()?;

    if publish {
        store.put(&ArtifactPath::try_from(CARD_PATH)?, rendered.as_bytes())?;
        info!(
            configs = catalog.len(),
            runs = catalog.run_count(),
            "dataset card written to {:?}",
            store_dir.join(CARD_PATH)
        );
    } else {
        println!("{rendered}");
    }
    Ok(())
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

/// Save a run's artifacts locally and push them to the store
#[allow(clippy::too_many_arguments)]
fn cmd_publish(
    results: &Path,
    samples: Option<&Path>,
    model_args: &str,
    model_source: &str,
    output_path: &Path,
    store_dir: Option<&Path>,
    run_id: Option<&str>,
    args: &CatalogArgs,
) -> Result<()> {
    let run = match run_id {
        Some(id) => RunId::try_from(id)?,
        None => RunId::now(),
    };
    let results: Value = read_json_file(results)?;
    let samples: Option<BTreeMap<String, Vec<Value>>> =
        samples.map(read_json_file).transpose()?;

    let store = store_dir.map(open_store).transpose()?;
    let push = store.is_some();
    let config = PublishConfig {
        output_path: Some(output_path.to_path_buf()),
        ..PublishConfig::from_env()
    }
    .with_push(push, push)
    .with_catalog_options(args.options());

    let tracker = ModelTracker::start(model_source, model_args);
    if tracker.model_name.is_empty() {
        anyhow::bail!("No model name found in model arguments: {:?}", model_args);
    }
    let mut publisher = EvalPublisher::new(config, tracker, store);

    let saved = publisher
        .save_results_aggregated(&run, results, samples.as_ref())
        .context("Failed to save aggregated results")?;
    if let Some(path) = saved {
        println!("Saved results to {:?}", path);
    }

    for (task, task_samples) in samples.iter().flatten() {
        let saved = publisher
            .save_results_samples(&run, task, task_samples)
            .with_context(|| format!("Failed to save samples for task {task}"))?;
        if let Some(path) = saved {
            println!("Saved {} sample(s) of {} to {:?}", task_samples.len(), task, path);
        }
    }

    println!("Run {run} published for {}", publisher.tracker().model_name);
    Ok(())
}
