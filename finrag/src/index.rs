//! The persistent vector index over the statement corpus.
//!
//! [`VectorIndex`] pairs an [`EmbeddingProvider`] with a [`VectorStore`]. A
//! collection is built once and then reused: [`VectorIndex::build`] is a no-op
//! when the collection already exists, so a changed corpus is never re-indexed
//! automatically. Delete the collection to force a rebuild.

use std::sync::Arc;

use tracing::{error, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionInfo, VectorStore};

/// What [`VectorIndex::build`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The collection was embedded and written.
    Built {
        /// Number of chunks stored.
        chunk_count: usize,
    },
    /// The collection already existed; nothing was written.
    AlreadyExists,
}

/// Builds and opens collections of embedded chunks.
#[derive(Clone)]
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl VectorIndex {
    /// Create an index over `store` using `embedder` for both building and querying.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Return a reference to the embedding provider.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Returns `true` if the collection exists in the store.
    pub async fn exists(&self, collection: &str) -> Result<bool> {
        self.store.collection_exists(collection).await
    }

    /// Embed `chunks` and persist them as `collection`, unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] or [`RagError::VectorStoreError`]
    /// if embedding or the write fails; nothing is persisted in that case.
    pub async fn build(&self, collection: &str, chunks: Vec<Chunk>) -> Result<BuildOutcome> {
        if self.exists(collection).await? {
            info!(collection, "collection already exists, skipping build");
            return Ok(BuildOutcome::AlreadyExists);
        }

        let mut chunks = chunks;
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(collection, error = %e, "embedding failed during build");
            e
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedder.model_name().to_string(),
                message: format!(
                    "expected {} embeddings, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let collection_info = CollectionInfo {
            name: collection.to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            dimensions: self.embedder.dimensions(),
            chunk_count: chunks.len(),
        };
        self.store.write_collection(collection_info, &chunks).await.map_err(|e| {
            error!(collection, error = %e, "failed to persist collection");
            e
        })?;

        let chunk_count = chunks.len();
        info!(collection, chunk_count, model = self.embedder.model_name(), "built collection");
        Ok(BuildOutcome::Built { chunk_count })
    }

    /// Open a retriever returning the `k` nearest chunks of an existing collection.
    ///
    /// # Errors
    ///
    /// - [`RagError::CollectionNotFound`] if the collection has not been built.
    /// - [`RagError::EmbeddingModelMismatch`] if it was built with another
    ///   embedding model or dimension.
    pub async fn retriever(&self, collection: &str, k: usize) -> Result<RetrieverHandle> {
        if !self.exists(collection).await? {
            return Err(RagError::CollectionNotFound(collection.to_string()));
        }

        let info = self.store.collection_info(collection).await?;
        let model = self.embedder.model_name();
        let dimensions = self.embedder.dimensions();
        if info.embedding_model != model || info.dimensions != dimensions {
            return Err(RagError::EmbeddingModelMismatch {
                collection: collection.to_string(),
                expected: format!("{model} ({dimensions}d)"),
                found: format!("{} ({}d)", info.embedding_model, info.dimensions),
            });
        }

        Ok(RetrieverHandle {
            collection: collection.to_string(),
            k,
            embedder: Arc::clone(&self.embedder),
            store: Arc::clone(&self.store),
        })
    }
}

/// A handle bound to one built collection that answers nearest-neighbor queries.
///
/// Cheap to clone and safe to share between concurrent readers.
#[derive(Clone)]
pub struct RetrieverHandle {
    collection: String,
    k: usize,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl RetrieverHandle {
    /// The collection this handle reads from.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of chunks returned per query.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Embed `text` and return the `k` closest chunks, most similar first.
    pub async fn query(&self, text: &str) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(text).await?;
        let results = self.store.search(&self.collection, &embedding, self.k).await?;
        info!(collection = %self.collection, result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}
