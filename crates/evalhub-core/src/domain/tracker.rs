//! Model identity and evaluation timing recorded alongside aggregated results.

use std::sync::OnceLock;
use std::time::Instant;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keys tried in order when extracting the model name from model arguments.
/// Adapter keys come first: `peft=` and `delta=` are passed together with
/// `pretrained=` and name the evaluated model.
const MODEL_NAME_KEYS: [&str; 6] = ["peft=", "delta=", "pretrained=", "model=", "path=", "engine="];

fn unsafe_path_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["<>:/|\\?*\[\]]+"#).expect("static regex"))
}

/// Extract the model name from a comma-separated `key=value` argument string.
pub fn extract_model_name(model_args: &str) -> String {
    MODEL_NAME_KEYS
        .iter()
        .find_map(|key| {
            model_args
                .find(key)
                .map(|idx| &model_args[idx + key.len()..])
        })
        .map(|rest| rest.split(',').next().unwrap_or_default().to_string())
        .unwrap_or_default()
}

/// Replace every run of path-unsafe characters with `__`.
pub fn sanitize_model_name(model_name: &str) -> String {
    unsafe_path_chars()
        .replace_all(model_name, "__")
        .into_owned()
}

/// Tracker for the evaluated model and the evaluation wall-clock time.
///
/// Serialises to the fields merged into the aggregated-results document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTracker {
    /// Source of the model (e.g. `hf`, `gguf`, `openai`).
    pub model_source: String,
    pub model_name: String,
    /// Directory name artifacts are stored under.
    pub model_name_sanitized: String,
    #[serde(rename = "start_time")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "end_time")]
    pub ended_at: Option<DateTime<Utc>>,
    pub total_evaluation_time_seconds: Option<String>,
    #[serde(skip, default = "Instant::now")]
    clock: Instant,
}

impl ModelTracker {
    /// Start the evaluation timer.
    pub fn start(model_source: &str, model_args: &str) -> Self {
        let model_name = extract_model_name(model_args);
        Self {
            model_source: model_source.to_string(),
            model_name_sanitized: sanitize_model_name(&model_name),
            model_name,
            started_at: Utc::now(),
            ended_at: None,
            total_evaluation_time_seconds: None,
            clock: Instant::now(),
        }
    }

    /// Record the end time and the total evaluation time.
    pub fn log_end_time(&mut self) {
        self.ended_at = Some(Utc::now());
        self.total_evaluation_time_seconds = Some(self.clock.elapsed().as_secs_f64().to_string());
    }

    /// Whether the model is hosted on the hub (links are rendered for it).
    pub fn is_hub_model(&self) -> bool {
        self.model_source == "hf"
    }
}
