//! Token-bounded document chunking.
//!
//! [`TokenChunker`] splits a statement into windows of at most `max_tokens`
//! tokens, each sharing `overlap_tokens` tokens with the previous window.
//! Boundaries always fall on token starts reported by a [`TokenCounter`], so
//! chunks cover the input without gaps.

use std::collections::HashMap;
use std::sync::Arc;

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};
use crate::tokenizer::TokenCounter;

/// Default fraction of `max_tokens` shared between consecutive chunks (1/50).
pub const DEFAULT_OVERLAP_FRACTION: f32 = 0.02;

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the vector index.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no text.
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Splits text into overlapping windows measured in tokens.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk records
/// `chunk_index`, `token_start`, `token_end`, `byte_start`, `byte_end` and
/// `source` in its metadata.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use finrag::{TokenChunker, WhitespaceTokenizer};
///
/// let chunker = TokenChunker::with_overlap_fraction(Arc::new(WhitespaceTokenizer), 8192, 0.02)?;
/// let chunks = chunker.chunk(&document)?;
/// ```
#[derive(Clone)]
pub struct TokenChunker {
    counter: Arc<dyn TokenCounter>,
    max_tokens: usize,
    overlap_tokens: usize,
}

impl std::fmt::Debug for TokenChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenChunker")
            .field("counter", &self.counter.name())
            .field("max_tokens", &self.max_tokens)
            .field("overlap_tokens", &self.overlap_tokens)
            .finish()
    }
}

impl TokenChunker {
    /// Create a new `TokenChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `max_tokens == 0` or
    /// `overlap_tokens >= max_tokens`.
    pub fn new(
        counter: Arc<dyn TokenCounter>,
        max_tokens: usize,
        overlap_tokens: usize,
    ) -> Result<Self> {
        if max_tokens == 0 {
            return Err(RagError::ConfigError("max_tokens must be greater than zero".into()));
        }
        if overlap_tokens >= max_tokens {
            return Err(RagError::ConfigError(format!(
                "overlap_tokens ({overlap_tokens}) must be less than max_tokens ({max_tokens})"
            )));
        }
        Ok(Self { counter, max_tokens, overlap_tokens })
    }

    /// Create a chunker whose overlap is `floor(max_tokens * fraction)`.
    pub fn with_overlap_fraction(
        counter: Arc<dyn TokenCounter>,
        max_tokens: usize,
        fraction: f32,
    ) -> Result<Self> {
        Self::new(counter, max_tokens, overlap_for(max_tokens, fraction)?)
    }

    /// Maximum tokens per chunk.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Tokens shared between consecutive chunks.
    pub fn overlap_tokens(&self) -> usize {
        self.overlap_tokens
    }

    /// Split raw text into `(byte_start, byte_end, token_start, token_end)` windows.
    fn windows(&self, text: &str) -> Result<Vec<(usize, usize, usize, usize)>> {
        let offsets = self.counter.token_offsets(text)?;
        let total = offsets.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let step = self.max_tokens - self.overlap_tokens;
        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.max_tokens).min(total);
            let byte_start = offsets[start];
            let byte_end = if end < total { offsets[end] } else { text.len() };
            windows.push((byte_start, byte_end, start, end));
            if end == total {
                break;
            }
            start += step;
        }
        Ok(windows)
    }
}

/// Derive an overlap token count from a fraction of `max_tokens`.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `fraction` is outside `[0, 1)`.
pub fn overlap_for(max_tokens: usize, fraction: f32) -> Result<usize> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(RagError::ConfigError(format!(
            "overlap fraction ({fraction}) must be in [0, 1)"
        )));
    }
    // f32 fractions such as 0.02 are slightly below their decimal value
    Ok((max_tokens as f64 * f64::from(fraction) + 1e-6).floor() as usize)
}

impl Chunker for TokenChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let text = document.text();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let source = document.source_path.display().to_string();
        let chunks = self
            .windows(&text)?
            .into_iter()
            .enumerate()
            .map(|(i, (byte_start, byte_end, token_start, token_end))| {
                let metadata = HashMap::from([
                    ("chunk_index".to_string(), i.to_string()),
                    ("token_start".to_string(), token_start.to_string()),
                    ("token_end".to_string(), token_end.to_string()),
                    ("byte_start".to_string(), byte_start.to_string()),
                    ("byte_end".to_string(), byte_end.to_string()),
                    ("source".to_string(), source.clone()),
                ]);
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text: text[byte_start..byte_end].to_string(),
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect();
        Ok(chunks)
    }
}

fn byte_field(chunk: &Chunk, key: &str) -> Result<usize> {
    chunk
        .metadata
        .get(key)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| RagError::ChunkingError(format!("chunk '{}' is missing {key}", chunk.id)))
}

/// Rebuild the source text of consecutive chunks from one document by
/// dropping each chunk's overlap with its predecessor.
///
/// # Errors
///
/// Returns [`RagError::ChunkingError`] if a chunk lacks byte offsets or the
/// chunks are not contiguous.
pub fn reassemble(chunks: &[Chunk]) -> Result<String> {
    let mut text = String::new();
    let mut covered = 0usize;
    for chunk in chunks {
        let start = byte_field(chunk, "byte_start")?;
        let end = byte_field(chunk, "byte_end")?;
        if start > covered || end < covered {
            return Err(RagError::ChunkingError(format!(
                "chunk '{}' leaves a gap at byte {covered}",
                chunk.id
            )));
        }
        text.push_str(&chunk.text[covered - start..]);
        covered = end;
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceTokenizer;

    fn doc(text: &str) -> Document {
        Document::new("January", vec![text.to_string()], "KnowledgeBase/January.txt")
    }

    fn chunker(max: usize, overlap: usize) -> TokenChunker {
        TokenChunker::new(Arc::new(WhitespaceTokenizer), max, overlap).unwrap()
    }

    #[test]
    fn short_input_yields_one_chunk() {
        let chunks = chunker(10, 1).chunk(&doc("Grocery $50 debit, balance $950")).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Grocery $50 debit, balance $950");
        assert_eq!(chunks[0].id, "January_0");
        assert_eq!(chunks[0].document_id, "January");
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        assert!(chunker(10, 1).chunk(&doc("")).unwrap().is_empty());
    }

    #[test]
    fn consecutive_chunks_share_overlap_tokens() {
        let chunks = chunker(4, 1).chunk(&doc("a b c d e f g")).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a b c d ", "d e f g"]);
        assert_eq!(chunks[1].metadata["token_start"], "3");
        assert_eq!(reassemble(&chunks).unwrap(), "a b c d e f g");
    }

    #[test]
    fn pages_are_joined_before_chunking() {
        let document = Document::new(
            "March",
            vec!["Date Debit".to_string(), "Rent 1200".to_string()],
            "March.pdf",
        );
        let chunks = chunker(100, 2).chunk(&document).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Date Debit\n\nRent 1200");
    }

    #[test]
    fn rejects_overlap_not_below_max() {
        assert!(TokenChunker::new(Arc::new(WhitespaceTokenizer), 5, 5).is_err());
        assert!(TokenChunker::new(Arc::new(WhitespaceTokenizer), 0, 0).is_err());
    }

    #[test]
    fn overlap_fraction_uses_one_fiftieth_by_default() {
        assert_eq!(overlap_for(8192, DEFAULT_OVERLAP_FRACTION).unwrap(), 163);
        assert_eq!(overlap_for(100, DEFAULT_OVERLAP_FRACTION).unwrap(), 2);
        assert!(overlap_for(100, 1.0).is_err());
    }
}
