//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is suitable
//! for tests and single-process runs where the collection need not survive a
//! restart.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionInfo, VectorStore, rank};

/// A collection header together with its chunks in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredCollection {
    pub(crate) info: CollectionInfo,
    pub(crate) chunks: Vec<Chunk>,
}

impl StoredCollection {
    pub(crate) fn new(mut info: CollectionInfo, chunks: &[Chunk]) -> Result<Self> {
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != info.dimensions) {
            return Err(RagError::VectorStoreError {
                backend: "collection".to_string(),
                message: format!(
                    "chunk '{}' has {} dimensions, collection '{}' expects {}",
                    bad.id,
                    bad.embedding.len(),
                    info.name,
                    info.dimensions
                ),
            });
        }
        info.chunk_count = chunks.len();
        Ok(Self { info, chunks: chunks.to_vec() })
    }
}

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as collection name → [`CollectionInfo`] plus an
/// ordered chunk list. All operations are async-safe via `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use finrag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// assert!(!store.collection_exists("transactions").await?);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, StoredCollection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let collections = self.collections.read().await;
        collections
            .get(name)
            .map(|c| c.info.clone())
            .ok_or_else(|| RagError::CollectionNotFound(name.to_string()))
    }

    async fn write_collection(&self, info: CollectionInfo, chunks: &[Chunk]) -> Result<()> {
        let stored = StoredCollection::new(info, chunks)?;
        let mut collections = self.collections.write().await;
        collections.insert(stored.info.name.clone(), stored);
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
        Ok(rank(&stored.chunks, embedding, top_k))
    }
}
