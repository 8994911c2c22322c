//! Data types for statement documents, chunks, and search results.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A statement document loaded from the corpus directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier derived from the file stem, e.g. `January`.
    pub id: String,
    /// Extracted text, one entry per page, in page order.
    pub pages: Vec<String>,
    /// The file the document was loaded from.
    pub source_path: PathBuf,
}

impl Document {
    /// Create a document from its identifier and page texts.
    pub fn new(id: impl Into<String>, pages: Vec<String>, source_path: impl Into<PathBuf>) -> Self {
        Self { id: id.into(), pages, source_path: source_path.into() }
    }

    /// The full document text with pages separated by a blank line.
    pub fn text(&self) -> String {
        self.pages.join("\n\n")
    }

    /// Returns `true` if no page contains any non-whitespace text, as with
    /// scanned PDFs that carry no text layer.
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// A token-bounded span of a [`Document`], optionally carrying its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk, `{document_id}_{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until embedded.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Chunk-specific fields such as `chunk_index`, `token_start` and `token_end`.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
