//! Vector store trait for persisting and searching chunk embeddings.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// Descriptive header stored alongside every collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionInfo {
    /// The collection name.
    pub name: String,
    /// The embedding model that produced the stored vectors.
    pub embedding_model: String,
    /// Dimensionality of the stored vectors.
    pub dimensions: usize,
    /// Number of stored chunks.
    pub chunk_count: usize,
}

/// A storage backend for named collections of embedded chunks.
///
/// A collection is written in one piece by
/// [`write_collection`](VectorStore::write_collection): after the call it either
/// exists in full or not at all. Readers may search concurrently.
///
/// # Example
///
/// ```rust,ignore
/// use finrag::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// if !store.collection_exists("transactions").await? {
///     store.write_collection(info, &chunks).await?;
/// }
/// let results = store.search("transactions", &query_embedding, 1).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns `true` if a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Header of an existing collection.
    ///
    /// Returns [`RagError::CollectionNotFound`](crate::RagError::CollectionNotFound)
    /// if it does not exist.
    async fn collection_info(&self, name: &str) -> Result<CollectionInfo>;

    /// Atomically create or replace a collection with the given chunks.
    /// Chunks must have embeddings set.
    async fn write_collection(&self, info: CollectionInfo, chunks: &[Chunk]) -> Result<()>;

    /// Delete a named collection and all its data. No-op if absent.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score; ties keep
    /// insertion order.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score `chunks` against `embedding` and keep the best `top_k`.
///
/// The sort is stable, so equal scores keep the chunks' stored order.
pub(crate) fn rank(chunks: &[Chunk], embedding: &[f32], top_k: usize) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = chunks
        .iter()
        .map(|chunk| SearchResult {
            score: cosine_similarity(&chunk.embedding, embedding),
            chunk: chunk.clone(),
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}
