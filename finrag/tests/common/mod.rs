//! Shared doubles for integration tests: call-counting store, embedder,
//! extractor and generators.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use finrag::{
    AnswerGenerator, Chunk, CollectionInfo, CorpusLoader, EmbeddingProvider,
    HashEmbeddingProvider, InMemoryVectorStore, PageExtractor, QueryRouter, RagConfig, RagError,
    SearchResult, TextExtractor, VectorIndex, VectorStore,
};

/// Wraps [`InMemoryVectorStore`] and counts writes and searches.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryVectorStore,
    pub writes: AtomicUsize,
    pub searches: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    async fn collection_exists(&self, name: &str) -> finrag::Result<bool> {
        self.inner.collection_exists(name).await
    }

    async fn collection_info(&self, name: &str) -> finrag::Result<CollectionInfo> {
        self.inner.collection_info(name).await
    }

    async fn write_collection(&self, info: CollectionInfo, chunks: &[Chunk]) -> finrag::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_collection(info, chunks).await
    }

    async fn delete_collection(&self, name: &str) -> finrag::Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> finrag::Result<Vec<SearchResult>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(collection, embedding, top_k).await
    }
}

/// Wraps [`HashEmbeddingProvider`] and counts every text embedded.
pub struct CountingEmbedder {
    inner: HashEmbeddingProvider,
    pub calls: AtomicUsize,
}

impl Default for CountingEmbedder {
    fn default() -> Self {
        Self { inner: HashEmbeddingProvider::new(128), calls: AtomicUsize::new(0) }
    }
}

impl CountingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed(&self, text: &str) -> finrag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Text extractor that counts how many documents were parsed.
#[derive(Default)]
pub struct CountingExtractor {
    pub calls: AtomicUsize,
}

impl CountingExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageExtractor for CountingExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    fn extract(&self, path: &Path) -> finrag::Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TextExtractor.extract(path)
    }
}

/// Records every prompt and answers with a fixed text.
#[derive(Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AnswerGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> finrag::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("You spent $50 on groceries.".to_string())
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

/// Always fails like an unreachable provider.
pub struct FailingGenerator;

#[async_trait]
impl AnswerGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> finrag::Result<String> {
        Err(RagError::GenerationError {
            provider: "failing".to_string(),
            message: "service unavailable".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledGenerator;

#[async_trait]
impl AnswerGenerator for StalledGenerator {
    async fn generate(&self, _prompt: &str) -> finrag::Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }

    fn model_name(&self) -> &str {
        "stalled"
    }
}

/// Everything a router test needs to inspect afterwards.
pub struct Harness {
    pub corpus: tempfile::TempDir,
    pub store: Arc<CountingStore>,
    pub embedder: Arc<CountingEmbedder>,
    pub extractor: Arc<CountingExtractor>,
    pub generator: Arc<RecordingGenerator>,
    pub router: Arc<QueryRouter>,
}

/// Write `files` (name, text) into a fresh corpus directory.
pub fn corpus(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in files {
        std::fs::write(dir.path().join(name), text).unwrap();
    }
    dir
}

pub fn config(corpus_dir: &Path) -> RagConfig {
    RagConfig::builder()
        .corpus_dir(corpus_dir)
        .max_chunk_tokens(50)
        .overlap_fraction(0.02)
        .top_k(1)
        .generation_timeout_secs(1)
        .build()
        .unwrap()
}

pub fn harness(files: &[(&str, &str)]) -> Harness {
    harness_with(files, Arc::new(RecordingGenerator::default()))
}

pub fn harness_with(files: &[(&str, &str)], generator: Arc<RecordingGenerator>) -> Harness {
    let corpus = corpus(files);
    let store = Arc::new(CountingStore::default());
    let embedder = Arc::new(CountingEmbedder::default());
    let extractor = Arc::new(CountingExtractor::default());
    let router = QueryRouter::builder()
        .config(config(corpus.path()))
        .loader(CorpusLoader::new(corpus.path()).with_extractor(extractor.clone()))
        .index(VectorIndex::new(embedder.clone(), store.clone()))
        .generator(generator.clone())
        .build()
        .unwrap();
    Harness { corpus, store, embedder, extractor, generator, router: Arc::new(router) }
}

/// A router over an in-memory index with the given generator.
pub fn router_with_generator(
    files: &[(&str, &str)],
    generator: Arc<dyn AnswerGenerator>,
) -> (tempfile::TempDir, QueryRouter) {
    let corpus = corpus(files);
    let router = QueryRouter::builder()
        .config(config(corpus.path()))
        .index(VectorIndex::new(
            Arc::new(HashEmbeddingProvider::new(64)),
            Arc::new(InMemoryVectorStore::new()),
        ))
        .generator(generator)
        .build()
        .unwrap();
    (corpus, router)
}
