//! Token counting for chunk boundaries.
//!
//! A [`TokenCounter`] reports where each token starts in a text. The chunker
//! uses those offsets both to bound chunk sizes and to cut chunk text on token
//! boundaries, so the counter should match the embedding model's tokenizer.

use crate::error::Result;

/// Splits text into tokens and reports the byte offset at which each starts.
///
/// The returned offsets must be strictly increasing and, for non-empty text,
/// start at `0`. Text between two consecutive offsets belongs to the earlier
/// token, so the offsets partition the whole input.
pub trait TokenCounter: Send + Sync {
    /// Byte offsets of token starts in `text`. Empty text has no tokens.
    fn token_offsets(&self, text: &str) -> Result<Vec<usize>>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.token_offsets(text)?.len())
    }
}

/// Treats every run of non-whitespace characters as one token.
///
/// Whitespace is attached to the token before it; leading whitespace belongs
/// to the first token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl TokenCounter for WhitespaceTokenizer {
    fn token_offsets(&self, text: &str) -> Result<Vec<usize>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut offsets = Vec::new();
        let mut prev_is_space = true;
        for (i, c) in text.char_indices() {
            let is_space = c.is_whitespace();
            if prev_is_space && !is_space {
                offsets.push(i);
            }
            prev_is_space = is_space;
        }

        match offsets.first_mut() {
            Some(first) => *first = 0,
            // whitespace-only input
            None => offsets.push(0),
        }
        Ok(offsets)
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Normalize raw token start offsets into the [`TokenCounter`] contract.
#[cfg_attr(not(feature = "hf-tokenizer"), allow(dead_code))]
fn normalize_offsets(text: &str, mut starts: Vec<usize>) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }
    starts.retain(|&s| s < text.len() && text.is_char_boundary(s));
    starts.sort_unstable();
    starts.dedup();
    match starts.first_mut() {
        Some(first) => *first = 0,
        None => starts.push(0),
    }
    starts
}

#[cfg(feature = "hf-tokenizer")]
pub use hf::HuggingFaceTokenizer;

#[cfg(feature = "hf-tokenizer")]
mod hf {
    use std::path::Path;

    use tokenizers::Tokenizer;
    use tracing::debug;

    use super::{TokenCounter, normalize_offsets};
    use crate::error::{RagError, Result};

    /// A [`TokenCounter`] backed by a Hugging Face `tokenizer.json`.
    ///
    /// Load the tokenizer that ships with the embedding model so chunk sizes
    /// respect the model's input limit.
    pub struct HuggingFaceTokenizer {
        inner: Tokenizer,
        name: String,
    }

    impl HuggingFaceTokenizer {
        /// Load a tokenizer from a `tokenizer.json` file.
        ///
        /// Truncation and padding stored in the file are cleared: every token
        /// of the text must be counted for chunks to stay within their bound.
        pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            let load_error = |e: tokenizers::Error| {
                RagError::ConfigError(format!(
                    "failed to load tokenizer from {}: {e}",
                    path.display()
                ))
            };
            let mut inner = Tokenizer::from_file(path).map_err(load_error)?;
            inner.with_truncation(None).map_err(load_error)?;
            inner.with_padding(None);
            let name = path
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "huggingface".to_string());
            debug!(tokenizer = %name, "loaded tokenizer");
            Ok(Self { inner, name })
        }
    }

    impl TokenCounter for HuggingFaceTokenizer {
        fn token_offsets(&self, text: &str) -> Result<Vec<usize>> {
            let encoding = self
                .inner
                .encode(text, false)
                .map_err(|e| RagError::ChunkingError(format!("tokenization failed: {e}")))?;
            let starts = encoding.get_offsets().iter().map(|(start, _)| *start).collect();
            Ok(normalize_offsets(text, starts))
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}
