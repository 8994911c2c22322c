//! Durable vector store backed by one JSON snapshot per collection.
//!
//! Each collection lives in `<store_dir>/<name>.json`. Writes go to a
//! temporary file that is renamed into place, so a crash mid-write leaves
//! either the previous snapshot or none. Loaded snapshots are cached in memory
//! for concurrent readers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::inmemory::StoredCollection;
use crate::vectorstore::{CollectionInfo, VectorStore, rank};

const BACKEND: &str = "file";

/// A [`VectorStore`] that persists collections under a directory.
///
/// Single writer per collection name; concurrent writers from several
/// processes are not coordinated.
///
/// # Example
///
/// ```rust,ignore
/// use finrag::FileVectorStore;
///
/// let store = FileVectorStore::open("VectorStore").await?;
/// let exists = store.collection_exists("transactions").await?;
/// ```
#[derive(Debug)]
pub struct FileVectorStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<StoredCollection>>>,
}

impl FileVectorStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(store_dir = %dir.display(), "opened file vector store");
        Ok(Self { dir, cache: RwLock::new(HashMap::new()) })
    }

    /// The directory holding collection snapshots.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn map_err(message: impl Into<String>) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: message.into() }
    }

    fn snapshot_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Self::map_err(format!(
                "invalid collection name '{name}': use ASCII letters, digits, '_' or '-'"
            )));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    async fn load(&self, name: &str) -> Result<Arc<StoredCollection>> {
        if let Some(stored) = self.cache.read().await.get(name) {
            return Ok(Arc::clone(stored));
        }

        let path = self.snapshot_path(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RagError::CollectionNotFound(name.to_string()));
            }
            Err(e) => return Err(Self::map_err(format!("failed to read {}: {e}", path.display()))),
        };
        let stored: StoredCollection = serde_json::from_slice(&bytes)
            .map_err(|e| Self::map_err(format!("corrupt snapshot {}: {e}", path.display())))?;

        debug!(collection = name, chunk_count = stored.chunks.len(), "loaded collection snapshot");
        let stored = Arc::new(stored);
        self.cache.write().await.insert(name.to_string(), Arc::clone(&stored));
        Ok(stored)
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        if self.cache.read().await.contains_key(name) {
            return Ok(true);
        }
        let path = self.snapshot_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        Ok(self.load(name).await?.info.clone())
    }

    async fn write_collection(&self, info: CollectionInfo, chunks: &[Chunk]) -> Result<()> {
        let path = self.snapshot_path(&info.name)?;
        let stored = StoredCollection::new(info, chunks)?;
        let bytes = serde_json::to_vec(&stored)
            .map_err(|e| Self::map_err(format!("failed to serialize collection: {e}")))?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        info!(
            collection = %stored.info.name,
            chunk_count = stored.info.chunk_count,
            bytes = bytes.len(),
            "persisted collection"
        );
        self.cache.write().await.insert(stored.info.name.clone(), Arc::new(stored));
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let path = self.snapshot_path(name)?;
        self.cache.write().await.remove(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let stored = self.load(collection).await?;
        Ok(rank(&stored.chunks, embedding, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> CollectionInfo {
        CollectionInfo {
            name: name.into(),
            embedding_model: "hash-2".into(),
            dimensions: 2,
            chunk_count: 0,
        }
    }

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.into(),
            text: format!("text of {id}"),
            embedding,
            metadata: HashMap::new(),
            document_id: "January".into(),
        }
    }

    #[tokio::test]
    async fn collection_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileVectorStore::open(dir.path()).await.unwrap();
            assert!(!store.collection_exists("transactions").await.unwrap());
            store
                .write_collection(
                    info("transactions"),
                    &[chunk("a", vec![1.0, 0.0]), chunk("b", vec![0.0, 1.0])],
                )
                .await
                .unwrap();
        }

        let reopened = FileVectorStore::open(dir.path()).await.unwrap();
        assert!(reopened.collection_exists("transactions").await.unwrap());
        let info = reopened.collection_info("transactions").await.unwrap();
        assert_eq!(info.chunk_count, 2);
        let results = reopened.search("transactions", &[0.0, 1.0], 1).await.unwrap();
        assert_eq!(results[0].chunk.id, "b");
        assert!(!dir.path().join("transactions.json.tmp").exists());
    }

    #[tokio::test]
    async fn open_creates_missing_store_dir() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("stores").join("finrag");

        let store = FileVectorStore::open(&nested).await.unwrap();

        assert_eq!(store.dir(), nested.as_path());
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn missing_collection_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::open(dir.path()).await.unwrap();
        let err = store.search("nope", &[1.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(err, RagError::CollectionNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn rejects_path_like_names_and_wrong_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::open(dir.path()).await.unwrap();
        assert!(store.collection_exists("../escape").await.is_err());
        let err = store.write_collection(info("ok"), &[chunk("a", vec![1.0])]).await;
        assert!(matches!(err, Err(RagError::VectorStoreError { .. })));
        assert!(!store.collection_exists("ok").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::open(dir.path()).await.unwrap();
        store.write_collection(info("t"), &[chunk("a", vec![1.0, 0.0])]).await.unwrap();
        store.delete_collection("t").await.unwrap();
        assert!(!store.collection_exists("t").await.unwrap());
        store.delete_collection("t").await.unwrap();
    }
}
