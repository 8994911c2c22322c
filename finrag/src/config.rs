//! Configuration for the statement question-answering pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunking::{DEFAULT_OVERLAP_FRACTION, overlap_for};
use crate::error::{RagError, Result};

/// Configuration parameters shared by every pipeline component.
///
/// Deserializes from partial JSON; missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Answer generation model identifier.
    pub generation_model: String,
    /// Answer generation temperature.
    pub temperature: f32,
    /// Maximum chunk size in tokens.
    pub max_chunk_tokens: usize,
    /// Fraction of `max_chunk_tokens` shared between consecutive chunks.
    pub overlap_fraction: f32,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Name of the collection holding the whole corpus.
    pub collection_name: String,
    /// Directory containing the statement documents.
    pub corpus_dir: PathBuf,
    /// Directory holding persisted collections.
    pub store_dir: PathBuf,
    /// Upper bound on a single answer generation call, in seconds.
    pub generation_timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_model: "hash-256".to_string(),
            generation_model: "llama3-70b-8192".to_string(),
            temperature: 0.1,
            max_chunk_tokens: 8192,
            overlap_fraction: DEFAULT_OVERLAP_FRACTION,
            top_k: 1,
            collection_name: "transactions".to_string(),
            corpus_dir: PathBuf::from("KnowledgeBase"),
            store_dir: PathBuf::from("VectorStore"),
            generation_timeout_secs: 120,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Overlap between consecutive chunks, in tokens.
    pub fn overlap_tokens(&self) -> usize {
        overlap_for(self.max_chunk_tokens, self.overlap_fraction).unwrap_or(0)
    }

    /// The generation timeout as a [`Duration`].
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `max_chunk_tokens == 0`
    /// - `overlap_fraction` is outside `[0, 1)`
    /// - `top_k == 0`
    /// - `temperature` is outside `[0, 2]`
    /// - `generation_timeout_secs == 0`
    /// - a model or collection name is empty
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_tokens == 0 {
            return Err(RagError::ConfigError("max_chunk_tokens must be greater than zero".into()));
        }
        let overlap = overlap_for(self.max_chunk_tokens, self.overlap_fraction)?;
        if overlap >= self.max_chunk_tokens {
            return Err(RagError::ConfigError(format!(
                "chunk overlap ({overlap}) must be less than max_chunk_tokens ({})",
                self.max_chunk_tokens
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be in [0, 2]",
                self.temperature
            )));
        }
        if self.generation_timeout_secs == 0 {
            return Err(RagError::ConfigError(
                "generation_timeout_secs must be greater than zero".to_string(),
            ));
        }
        for (field, value) in [
            ("embedding_model", &self.embedding_model),
            ("generation_model", &self.generation_model),
            ("collection_name", &self.collection_name),
        ] {
            if value.trim().is_empty() {
                return Err(RagError::ConfigError(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Start from an existing configuration, e.g. one read from a file.
    pub fn from_config(config: RagConfig) -> Self {
        Self { config }
    }

    /// Set the embedding model identifier.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the generation model identifier.
    pub fn generation_model(mut self, model: impl Into<String>) -> Self {
        self.config.generation_model = model.into();
        self
    }

    /// Set the generation temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the maximum chunk size in tokens.
    pub fn max_chunk_tokens(mut self, tokens: usize) -> Self {
        self.config.max_chunk_tokens = tokens;
        self
    }

    /// Set the overlap as a fraction of the maximum chunk size.
    pub fn overlap_fraction(mut self, fraction: f32) -> Self {
        self.config.overlap_fraction = fraction;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the collection name.
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the corpus directory.
    pub fn corpus_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.corpus_dir = dir.into();
        self
    }

    /// Set the collection store directory.
    pub fn store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.store_dir = dir.into();
        self
    }

    /// Set the generation timeout in seconds.
    pub fn generation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.generation_timeout_secs = secs;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
