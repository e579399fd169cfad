//! Dataset card assembly.
//!
//! The card is Markdown with a YAML front-matter header. The header lists
//! every config with its splits and paths (the layout config/split-aware
//! dataset loaders read); the body is a short narrative ending with the
//! metric table of the latest run.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::catalog::{Catalog, RESULTS_CONFIG};
use crate::domain::{EvalHubError, Result};

const FRONT_MATTER_DELIMITER: &str = "---\n";

/// Default hub endpoint used to render links.
pub const DEFAULT_HUB_ENDPOINT: &str = "https://huggingface.co";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Where the card is published and what model it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContext {
    pub repo_id: String,
    pub model_name: String,
    pub model_source: String,
    pub hub_endpoint: String,
}

impl CardContext {
    pub fn new(repo_id: &str, model_name: &str, model_source: &str) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            model_name: model_name.to_string(),
            model_source: model_source.to_string(),
            hub_endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
        }
    }

    pub fn with_hub_endpoint(mut self, endpoint: &str) -> Self {
        self.hub_endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    fn is_hub_model(&self) -> bool {
        self.model_source == "hf"
    }

    fn model_url(&self) -> String {
        format!("{}/{}", self.hub_endpoint, self.model_name)
    }

    /// Browsable URL of a file in the dataset repository.
    pub fn file_url(&self, repo_path: &str) -> String {
        format!(
            "{}/datasets/{}/blob/main/{}",
            self.hub_endpoint, self.repo_id, repo_path
        )
    }
}

/// Aggregated-results document: the `results` object maps each task to its
/// metric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub results: Map<String, Value>,
}

impl ResultsDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        match value.get("results") {
            Some(Value::Object(results)) => Ok(Self {
                results: results.clone(),
            }),
            Some(_) => Err(EvalHubError::InvalidResultsDocument(
                "`results` is not an object".to_string(),
            )),
            None => Err(EvalHubError::InvalidResultsDocument(
                "missing `results` key".to_string(),
            )),
        }
    }
}

/// The latest run's results together with where they live.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestResults {
    pub timestamp: String,
    pub repo_path: String,
    pub document: ResultsDocument,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFiles {
    pub split: String,
    pub path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub config_name: String,
    pub data_files: Vec<DataFiles>,
}

/// YAML front matter of the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHeader {
    pub pretty_name: String,
    pub dataset_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboard_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_of_contact: Option<String>,
    pub configs: Vec<ConfigEntry>,
}

/// Header entries for every config of the catalog, in config-name order.
pub fn config_entries(catalog: &Catalog) -> Vec<ConfigEntry> {
    catalog
        .configs
        .values()
        .map(|config| ConfigEntry {
            config_name: config.name.clone(),
            data_files: config
                .splits
                .iter()
                .map(|split| DataFiles {
                    split: split.name.clone(),
                    path: split.paths.clone(),
                })
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A rendered-or-parsed dataset card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetCard {
    pub header: CardHeader,
    pub body: String,
}

impl DatasetCard {
    /// Render as `---\n<yaml>---\n\n<body>`.
    pub fn render(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&self.header)?;
        Ok(format!(
            "{FRONT_MATTER_DELIMITER}{yaml}{FRONT_MATTER_DELIMITER}\n{}",
            self.body
        ))
    }

    /// Parse a card produced by [`DatasetCard::render`].
    pub fn parse(text: &str) -> Result<Self> {
        let rest = text
            .strip_prefix(FRONT_MATTER_DELIMITER)
            .ok_or_else(|| EvalHubError::InvalidCard("missing front matter".to_string()))?;
        let end = rest
            .find("\n---\n")
            .ok_or_else(|| EvalHubError::InvalidCard("unterminated front matter".to_string()))?;
        let header: CardHeader = serde_yaml::from_str(&rest[..=end])?;
        let body = &rest[end + "\n---\n".len()..];
        Ok(Self {
            header,
            body: body.strip_prefix('\n').unwrap_or(body).to_string(),
        })
    }
}

/// Metric table of a results document: the whole table under `"all"`,
/// followed by every entry at the top level, indented by four spaces.
///
/// Entries keep their document order. A task literally named `"all"`
/// replaces the aggregate in the leading slot.
pub fn render_metric_table(results: &Map<String, Value>) -> Result<String> {
    let mut table = Map::new();
    table.insert("all".to_string(), Value::Object(results.clone()));
    table.extend(results.clone());

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    Value::Object(table).serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| EvalHubError::InvalidResultsDocument(e.to_string()))
}

fn dataset_summary(
    catalog: &Catalog,
    latest: Option<&LatestResults>,
    ctx: &CardContext,
) -> Result<String> {
    let mut out = String::from("Dataset automatically created during the evaluation run of model ");
    if ctx.is_hub_model() {
        out.push_str(&format!("[{}]({})", ctx.model_name, ctx.model_url()));
    } else {
        out.push_str(&ctx.model_name);
    }
    out.push_str(".\n\n");

    out.push_str(&format!(
        "The dataset is composed of {} configuration(s), each one corresponding to one of the evaluated task.\n\n",
        catalog.task_config_count()
    ));
    out.push_str(&format!(
        "The dataset has been created from {} run(s). Each run can be found as a specific split in each \
         configuration, the split being named using the timestamp of the run. The \"latest\" split is always \
         pointing to the latest results.\n\n",
        catalog.run_count()
    ));
    out.push_str(&format!(
        "An additional configuration \"{RESULTS_CONFIG}\" store all the aggregated results of the run.\n\n"
    ));

    if ctx.is_hub_model() {
        let example = catalog
            .configs
            .keys()
            .find(|name| name.as_str() != RESULTS_CONFIG)
            .map(String::as_str)
            .unwrap_or(RESULTS_CONFIG);
        out.push_str("To load the details from a run, you can for instance do the following:\n");
        out.push_str(&format!(
            "```python\nfrom datasets import load_dataset\ndata = load_dataset(\n\t\"{}\",\n\t\"{}\",\n\tsplit=\"latest\"\n)\n```\n\n",
            ctx.repo_id, example
        ));
    }

    out.push_str("## Latest results\n\n");
    match latest {
        Some(latest) => {
            out.push_str(&format!(
                "These are the [latest results from run {}]({}) (note that there might be results for other \
                 tasks in the repos if successive evals didn't cover the same tasks. You find each in the \
                 results and the \"latest\" split for each eval):\n\n",
                latest.timestamp,
                ctx.file_url(&latest.repo_path)
            ));
            out.push_str(&format!(
                "```python\n{}\n```\n",
                render_metric_table(&latest.document.results)?
            ));
        }
        None => out.push_str("No aggregated results have been published yet.\n"),
    }
    Ok(out)
}

/// Assemble the publishable card for a catalog and the latest results.
pub fn build_description(
    catalog: &Catalog,
    latest: Option<&LatestResults>,
    ctx: &CardContext,
) -> Result<DatasetCard> {
    let pretty_name = format!("Evaluation run of {}", ctx.model_name);
    let summary = dataset_summary(catalog, latest, ctx)?;
    let body = format!("# Dataset Card for {pretty_name}\n\n{summary}");
    Ok(DatasetCard {
        header: CardHeader {
            pretty_name,
            dataset_summary: summary,
            repo_url: Some(ctx.model_url()),
            leaderboard_url: None,
            point_of_contact: None,
            configs: config_entries(catalog),
        },
        body,
    })
}
