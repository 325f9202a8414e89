use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::assemble::answer::{DEFAULT_WORD_LIMIT, MAX_WORD_LIMIT};
use crate::export::{ExportOptions, DEFAULT_FONT_SIZE, DEFAULT_HEADING};
use crate::mapping::mapper::{DEFAULT_FUZZY_THRESHOLD, DEFAULT_SEMANTIC_THRESHOLD};

/// Which semantic matching backend to use after fuzzy matching fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherBackend {
    /// Character-trigram cosine (default) — no model files needed
    Ngram,
    /// Sentence embeddings from the local all-MiniLM-L6-v2 ONNX model
    Embedding,
}

impl FromStr for MatcherBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "ngram" => Ok(MatcherBackend::Ngram),
            "embedding" | "embeddings" => Ok(MatcherBackend::Embedding),
            other => anyhow::bail!("Unknown matcher '{other}' (expected ngram or embedding)"),
        }
    }
}

impl MatcherBackend {
    pub fn name(self) -> &'static str {
        match self {
            MatcherBackend::Ngram => "ngram",
            MatcherBackend::Embedding => "embedding",
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// setting has a default, so an empty environment is valid.
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum token-sort score (0–100) for a fuzzy match
    pub fuzzy_threshold: f64,
    /// Minimum similarity (0–1) for a semantic match
    pub semantic_threshold: f64,
    pub matcher: MatcherBackend,
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
    /// Per-theory template overrides
    pub templates_dir: PathBuf,
    /// Replacement knowledge base JSON; the built-in one is used when unset
    pub knowledge_base: Option<PathBuf>,
    pub word_limit: usize,
    /// Title of exported Word documents
    pub heading: String,
    pub font_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            matcher: MatcherBackend::Ngram,
            model_dir: crate::model::default_model_dir(),
            templates_dir: PathBuf::from("./templates"),
            knowledge_base: None,
            word_limit: DEFAULT_WORD_LIMIT,
            heading: DEFAULT_HEADING.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `load` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fuzzy_threshold = parse_or(
            get("CASEWRITER_FUZZY_THRESHOLD"),
            "CASEWRITER_FUZZY_THRESHOLD",
            defaults.fuzzy_threshold,
        )?;
        if !(0.0..=100.0).contains(&fuzzy_threshold) {
            anyhow::bail!("CASEWRITER_FUZZY_THRESHOLD must be between 0 and 100, got {fuzzy_threshold}");
        }

        let semantic_threshold = parse_or(
            get("CASEWRITER_SEMANTIC_THRESHOLD"),
            "CASEWRITER_SEMANTIC_THRESHOLD",
            defaults.semantic_threshold,
        )?;
        if !(0.0..=1.0).contains(&semantic_threshold) {
            anyhow::bail!("CASEWRITER_SEMANTIC_THRESHOLD must be between 0 and 1, got {semantic_threshold}");
        }

        let matcher = match get("CASEWRITER_MATCHER") {
            Some(v) => v
                .parse::<MatcherBackend>()
                .context("Invalid CASEWRITER_MATCHER")?,
            None => defaults.matcher,
        };

        let word_limit: usize = parse_or(
            get("CASEWRITER_WORD_LIMIT"),
            "CASEWRITER_WORD_LIMIT",
            defaults.word_limit,
        )?;
        if word_limit == 0 {
            anyhow::bail!("CASEWRITER_WORD_LIMIT must be at least 1");
        }

        let font_size: usize = parse_or(
            get("CASEWRITER_FONT_SIZE"),
            "CASEWRITER_FONT_SIZE",
            defaults.font_size,
        )?;
        if font_size == 0 {
            anyhow::bail!("CASEWRITER_FONT_SIZE must be at least 1");
        }

        Ok(Self {
            fuzzy_threshold,
            semantic_threshold,
            matcher,
            model_dir: get("CASEWRITER_MODEL_DIR").map(PathBuf::from).unwrap_or(defaults.model_dir),
            templates_dir: get("CASEWRITER_TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.templates_dir),
            knowledge_base: get("CASEWRITER_KNOWLEDGE_BASE").map(PathBuf::from),
            word_limit: word_limit.min(MAX_WORD_LIMIT),
            heading: lookup("CASEWRITER_HEADING").unwrap_or(defaults.heading),
            font_size,
        })
    }

    /// Validate that the chosen matcher backend has what it needs.
    /// For embeddings the model files must exist (or the user should run
    /// download-model).
    pub fn require_matcher(&self) -> Result<()> {
        match self.matcher {
            MatcherBackend::Ngram => Ok(()),
            MatcherBackend::Embedding => {
                if !crate::model::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "Embedding model files not found in {}\n\
                         Run `casewriter download-model` to download them.\n\
                         Or set CASEWRITER_MATCHER=ngram to use the built-in matcher instead.",
                        crate::model::embedding_model_dir(&self.model_dir).display()
                    );
                }
                Ok(())
            }
        }
    }

    pub fn export_options(&self, overwrite: bool) -> ExportOptions {
        ExportOptions {
            overwrite,
            heading: Some(self.heading.clone()).filter(|h| !h.trim().is_empty()),
            font_size: self.font_size,
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {key} '{v}': {e}")),
        None => Ok(default),
    }
}
