//! Query routing and answer orchestration.
//!
//! The [`QueryRouter`] decides, per question, where the context comes from:
//!
//! - **Direct context**: the question names a month and a statement for that
//!   month exists. The statement is loaded, chunked, and every chunk goes into
//!   the prompt. The vector index is not touched.
//! - **Retrieval**: no month is named. The corpus collection is built on first
//!   use, then the `top_k` nearest chunks become the context.
//!
//! Both paths fill the same [`PromptTemplate`] and call the
//! [`AnswerGenerator`] exactly once.
//!
//! # Example
//!
//! ```rust,ignore
//! use finrag::{QueryRouter, RagConfig, VectorIndex};
//!
//! let router = QueryRouter::builder()
//!     .config(RagConfig::default())
//!     .index(VectorIndex::new(embedder, store))
//!     .generator(Arc::new(generator))
//!     .build()?;
//!
//! let answer = router.answer("What did I spend on groceries in January?").await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::chunking::{Chunker, TokenChunker};
use crate::config::RagConfig;
use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::generator::AnswerGenerator;
use crate::index::{BuildOutcome, RetrieverHandle, VectorIndex};
use crate::loader::CorpusLoader;
use crate::month::Month;
use crate::prompt::PromptTemplate;
use crate::tokenizer::WhitespaceTokenizer;

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Where a turn's context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// The whole statement for `month` was used as context.
    DirectContext {
        /// The month named in the question.
        month: Month,
    },
    /// Context came from nearest-neighbor retrieval over the corpus collection.
    Retrieval,
}

/// A generated answer and the route that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// The generated text.
    pub text: String,
    /// How the context was assembled.
    pub route: Route,
}

/// Routes questions to direct-context or retrieval and generates answers.
///
/// Holds no per-turn state: the only state that outlives a turn is the
/// persisted collection, so concurrent turns are safe once it is built.
pub struct QueryRouter {
    config: RagConfig,
    loader: CorpusLoader,
    chunker: Arc<dyn Chunker>,
    index: VectorIndex,
    generator: Arc<dyn AnswerGenerator>,
    prompt: PromptTemplate,
}

impl QueryRouter {
    /// Create a new [`QueryRouterBuilder`].
    pub fn builder() -> QueryRouterBuilder {
        QueryRouterBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Build the corpus collection unless it already exists.
    ///
    /// Documents that fail to load or hold no text are skipped. Every
    /// remaining document is chunked and embedded at chunk granularity.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyCorpus`] if no text could be loaded; no
    /// collection is written in that case.
    pub async fn ensure_collection(&self) -> Result<BuildOutcome> {
        let collection = self.config.collection_name.as_str();
        if self.index.exists(collection).await? {
            debug!(collection, "reusing existing collection");
            return Ok(BuildOutcome::AlreadyExists);
        }

        info!(collection, corpus_dir = %self.loader.dir().display(), "building collection from corpus");
        let loader = self.loader.clone();
        let chunker = Arc::clone(&self.chunker);
        let chunks = run_blocking(move || {
            let corpus = loader.load_all()?;
            let mut chunks = Vec::new();
            for document in &corpus.documents {
                if document.is_empty() {
                    warn!(document.id = %document.id, "skipping document without text");
                    continue;
                }
                chunks.extend(
                    chunker.chunk(document)?.into_iter().filter(|c| !c.text.trim().is_empty()),
                );
            }
            // Nothing is written for a corpus without text
            if chunks.is_empty() {
                return Err(RagError::EmptyCorpus(loader.dir().to_path_buf()));
            }
            Ok(chunks)
        })
        .await?;

        self.index.build(collection, chunks).await
    }

    /// Open a retriever on the corpus collection, building it first if absent.
    pub async fn retriever(&self) -> Result<RetrieverHandle> {
        self.ensure_collection().await?;
        self.index.retriever(&self.config.collection_name, self.config.top_k).await
    }

    /// Answer one question.
    ///
    /// # Errors
    ///
    /// - [`RagError::NoDocumentForMonth`] if the question names a month with no
    ///   statement; the generator is not called.
    /// - [`RagError::GenerationError`] if generation fails or exceeds the
    ///   configured timeout. There is no retry.
    /// - Loader, chunking, embedding or store errors from context assembly.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let (route, context) = match Month::find_in(question) {
            Some(month) => {
                let loader = self.loader.clone();
                let path = run_blocking(move || loader.find_month_document(month))
                    .await?
                    .ok_or(RagError::NoDocumentForMonth { month })?;
                info!(%month, path = %path.display(), "routing to direct context");
                (Route::DirectContext { month }, self.direct_context(path).await?)
            }
            None => {
                info!("routing to retrieval");
                (Route::Retrieval, self.retrieved_context(question).await?)
            }
        };

        let prompt = self.prompt.render(&context, question);
        let text = self.generate(&prompt).await?;
        info!(?route, answer_len = text.len(), "answered");
        Ok(Answer { text, route })
    }

    async fn direct_context(&self, path: PathBuf) -> Result<String> {
        let loader = self.loader.clone();
        let chunker = Arc::clone(&self.chunker);
        let chunks = run_blocking(move || chunker.chunk(&loader.load(&path)?)).await?;
        debug!(chunk_count = chunks.len(), "assembled direct context");
        Ok(join_chunks(chunks.iter()))
    }

    async fn retrieved_context(&self, question: &str) -> Result<String> {
        let results = self.retriever().await?.query(question).await?;
        Ok(join_chunks(results.iter().map(|r| &r.chunk)))
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let provider = self.generator.model_name().to_string();
        let timeout = self.config.generation_timeout();
        match tokio::time::timeout(timeout, self.generator.generate(prompt)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e @ RagError::GenerationError { .. })) => Err(e),
            Ok(Err(e)) => Err(RagError::GenerationError { provider, message: e.to_string() }),
            Err(_) => {
                error!(%provider, timeout_secs = timeout.as_secs(), "generation timed out");
                Err(RagError::GenerationError {
                    provider,
                    message: format!("timed out after {}s", timeout.as_secs()),
                })
            }
        }
    }
}

fn join_chunks<'a>(chunks: impl Iterator<Item = &'a Chunk>) -> String {
    chunks.map(|c| c.text.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}

/// Run blocking file and parsing work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| RagError::Io(std::io::Error::other(e)))?
}

/// Builder for constructing a [`QueryRouter`].
///
/// `config`, `index` and `generator` are required. The loader defaults to the
/// configured corpus directory, the chunker to a whitespace-token
/// [`TokenChunker`] sized by the configuration, and the prompt to
/// [`PromptTemplate::default`].
#[derive(Default)]
pub struct QueryRouterBuilder {
    config: Option<RagConfig>,
    loader: Option<CorpusLoader>,
    chunker: Option<Arc<dyn Chunker>>,
    index: Option<VectorIndex>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    prompt: Option<PromptTemplate>,
}

impl QueryRouterBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document loader.
    pub fn loader(mut self, loader: CorpusLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the vector index.
    pub fn index(mut self, index: VectorIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the answer generator.
    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the prompt template.
    pub fn prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Build the [`QueryRouter`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<QueryRouter> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let index =
            self.index.ok_or_else(|| RagError::ConfigError("index is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;
        let loader = self.loader.unwrap_or_else(|| CorpusLoader::new(&config.corpus_dir));
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(TokenChunker::new(
                Arc::new(WhitespaceTokenizer),
                config.max_chunk_tokens,
                config.overlap_tokens(),
            )?),
        };

        Ok(QueryRouter {
            config,
            loader,
            chunker,
            index,
            generator,
            prompt: self.prompt.unwrap_or_default(),
        })
    }
}
