//! Topic sources: where replenishment candidates come from.
//!
//! The queue manager only knows the [`TopicSource`] trait. Production runs use
//! [`LlmTopicSource`], which asks an OpenAI-compatible model for a batch of
//! titles; tests substitute in-memory fakes.
//!
//! Sources never raise. Every call resolves to a [`SourceOutcome`] so the
//! caller can tell "the model had nothing for us" apart from "the call broke".

use crate::api::{ModelClient, RetryPolicy};
use crate::utils::{clean_topic, truncate_for_log};
use awful_aj::config;
use awful_aj::config_dir;
use awful_aj::template;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

/// Result of asking a [`TopicSource`] for candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// At least one usable candidate.
    Topics(Vec<String>),
    /// The call succeeded but produced nothing usable.
    Empty,
    /// The call failed; the reason is kept for logging.
    Failed(String),
}

impl SourceOutcome {
    /// Wrap a candidate list, mapping an empty list to [`SourceOutcome::Empty`].
    pub fn from_topics(topics: Vec<String>) -> Self {
        if topics.is_empty() {
            SourceOutcome::Empty
        } else {
            SourceOutcome::Topics(topics)
        }
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOutcome::Topics(t) => write!(f, "{} candidate topics", t.len()),
            SourceOutcome::Empty => write!(f, "source returned no topics"),
            SourceOutcome::Failed(reason) => write!(f, "source failed: {reason}"),
        }
    }
}

/// Capability that proposes new candidate topics on demand.
pub trait TopicSource {
    /// Propose up to `n` candidate topics.
    async fn generate(&self, n: usize) -> SourceOutcome;
}

/// Build the user message asking the model for `n` topics.
pub fn topics_prompt(n: usize) -> String {
    format!(
        "Generate a list of {n} specific, practice-oriented topics for technical articles.\n\
         Avoid generic introductions such as \"What is Machine Learning\".\n\
         Format: one topic per line, no numbering, no bullets, no quotes, only the topic text."
    )
}

/// Split a raw model answer into at most `n` cleaned topic titles.
///
/// Blank lines and lines that clean down to nothing are discarded.
/// Duplicates are left for the queue to resolve.
pub fn parse_topics(raw: &str, n: usize) -> Vec<String> {
    raw.lines()
        .map(clean_topic)
        .filter(|t| !t.is_empty())
        .take(n)
        .collect()
}

/// [`TopicSource`] backed by an `awful_aj` chat completion.
///
/// The model configuration and chat template are resolved on first use, so a
/// run that never needs new topics never touches the LLM settings. A missing
/// or invalid configuration is reported as [`SourceOutcome::Failed`].
#[derive(Debug, Clone)]
pub struct LlmTopicSource {
    config_path: Option<PathBuf>,
    template_name: String,
}

impl LlmTopicSource {
    /// `config_path` overrides the default `config.yaml` in the awful_aj config dir.
    pub fn new(config_path: Option<PathBuf>, template_name: impl Into<String>) -> Self {
        Self {
            config_path,
            template_name: template_name.into(),
        }
    }

    async fn connect(&self) -> Result<ModelClient, Box<dyn Error>> {
        let conf_file = match &self.config_path {
            Some(path) => path.clone(),
            None => config_dir()?.join("config.yaml"),
        };
        let config_path = conf_file
            .to_str()
            .ok_or_else(|| format!("not a valid config filename: {}", conf_file.display()))?;
        let config = config::load_config(config_path)?;
        info!(config_path, "Loaded configuration");

        let template = template::load_template(&self.template_name).await?;
        info!(template = %self.template_name, "Loaded template");
        Ok(ModelClient::new(config, template))
    }
}

impl TopicSource for LlmTopicSource {
    #[instrument(level = "info", skip(self), fields(template = %self.template_name))]
    async fn generate(&self, n: usize) -> SourceOutcome {
        let client = match self.connect().await {
            Ok(loaded) => loaded,
            Err(e) => {
                error!(error = %e, "Could not load LLM configuration");
                return SourceOutcome::Failed(format!("configuration: {e}"));
            }
        };

        let prompt = topics_prompt(n);
        info!("Requesting topics from model");

        match RetryPolicy::default().ask(&client, &prompt).await {
            Ok(raw) => {
                debug!(response_preview = %truncate_for_log(&raw, 500), "Raw model response");
                let topics = parse_topics(&raw, n);
                if topics.is_empty() {
                    warn!(
                        response_preview = %truncate_for_log(&raw, 300),
                        "Model response contained no usable topics"
                    );
                } else {
                    info!(count = topics.len(), "Parsed topics from model response");
                }
                SourceOutcome::from_topics(topics)
            }
            Err(e) => SourceOutcome::Failed(e.to_string()),
        }
    }
}
