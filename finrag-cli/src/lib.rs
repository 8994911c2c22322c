//! Command-line wiring for `finrag`: flag parsing, configuration layering and
//! component construction.
//!
//! Configuration is resolved in increasing precedence:
//!
//! 1. [`RagConfig::default`]
//! 2. the JSON file given by `--config`
//! 3. `FINRAG_*` environment variables (a `.env` file is loaded first)
//! 4. command-line flags

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use finrag::groq::GroqAnswerGenerator;
use finrag::openai::OpenAIEmbeddingProvider;
use finrag::{
    EmbeddingProvider, FileVectorStore, HashEmbeddingProvider, HuggingFaceTokenizer, QueryRouter,
    RagConfig, RagConfigBuilder, RagError, TokenChunker, VectorIndex,
};
use tracing::info;

const HASH_MODEL_PREFIX: &str = "hash-";

/// Ask questions about monthly bank statements.
#[derive(Debug, Default, Parser)]
#[command(name = "finrag", version, about)]
pub struct Args {
    /// JSON configuration file
    #[arg(long, env = "FINRAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory containing the statements (January.pdf, ...)
    #[arg(long, env = "FINRAG_CORPUS_DIR")]
    pub corpus_dir: Option<PathBuf>,

    /// Directory holding persisted collections
    #[arg(long, env = "FINRAG_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Collection name for the whole corpus
    #[arg(long, env = "FINRAG_COLLECTION")]
    pub collection: Option<String>,

    /// Chunks retrieved per question
    #[arg(long, env = "FINRAG_TOP_K")]
    pub top_k: Option<usize>,

    /// Maximum chunk size in tokens
    #[arg(long, env = "FINRAG_MAX_CHUNK_TOKENS")]
    pub max_chunk_tokens: Option<usize>,

    /// Fraction of the chunk size shared by consecutive chunks
    #[arg(long, env = "FINRAG_OVERLAP_FRACTION")]
    pub overlap_fraction: Option<f32>,

    /// `hash-<dims>` for local hashing embeddings, otherwise an OpenAI model
    #[arg(long, env = "FINRAG_EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Groq chat model used to answer
    #[arg(long, env = "FINRAG_GENERATION_MODEL")]
    pub generation_model: Option<String>,

    /// Sampling temperature
    #[arg(long, env = "FINRAG_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Seconds to wait for an answer before giving up
    #[arg(long, env = "FINRAG_GENERATION_TIMEOUT_SECS")]
    pub generation_timeout_secs: Option<u64>,

    /// Hugging Face `tokenizer.json` used to size chunks instead of whitespace words
    #[arg(long, env = "FINRAG_TOKENIZER")]
    pub tokenizer: Option<PathBuf>,

    /// Build the collection and exit
    #[arg(long)]
    pub build_only: bool,

    /// Answer a single question and exit
    #[arg(long, short)]
    pub ask: Option<String>,
}

/// Merge defaults, the config file and overrides into a validated [`RagConfig`].
pub fn resolve_config(args: &Args) -> Result<RagConfig> {
    let base = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str::<RagConfig>(&text)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => RagConfig::default(),
    };

    let mut builder = RagConfigBuilder::from_config(base);
    if let Some(dir) = &args.corpus_dir {
        builder = builder.corpus_dir(dir.clone());
    }
    if let Some(dir) = &args.store_dir {
        builder = builder.store_dir(dir.clone());
    }
    if let Some(name) = &args.collection {
        builder = builder.collection_name(name.clone());
    }
    if let Some(k) = args.top_k {
        builder = builder.top_k(k);
    }
    if let Some(tokens) = args.max_chunk_tokens {
        builder = builder.max_chunk_tokens(tokens);
    }
    if let Some(fraction) = args.overlap_fraction {
        builder = builder.overlap_fraction(fraction);
    }
    if let Some(model) = &args.embedding_model {
        builder = builder.embedding_model(model.clone());
    }
    if let Some(model) = &args.generation_model {
        builder = builder.generation_model(model.clone());
    }
    if let Some(temperature) = args.temperature {
        builder = builder.temperature(temperature);
    }
    if let Some(secs) = args.generation_timeout_secs {
        builder = builder.generation_timeout_secs(secs);
    }
    Ok(builder.build()?)
}

/// Pick the embedding provider named by `config.embedding_model`.
///
/// `hash-<dims>` needs no credentials; any other model is served by the
/// OpenAI embeddings API and requires `OPENAI_API_KEY`.
pub fn embedding_provider(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let model = config.embedding_model.as_str();
    match model.strip_prefix(HASH_MODEL_PREFIX) {
        Some(dims) => {
            let dims = dims.parse::<usize>().ok().filter(|d| *d > 0).ok_or_else(|| {
                RagError::ConfigError(format!("invalid hash embedding model '{model}'"))
            })?;
            Ok(Arc::new(HashEmbeddingProvider::new(dims)))
        }
        None => Ok(Arc::new(OpenAIEmbeddingProvider::from_env()?.with_model(model))),
    }
}

/// Construct the router: file-backed index, Groq generator and chunker.
///
/// Fails if a provider credential is missing.
pub async fn build_router(args: &Args, config: RagConfig) -> Result<QueryRouter> {
    let embedder = embedding_provider(&config)?;
    let generator = GroqAnswerGenerator::from_env()?
        .with_model(&config.generation_model)
        .with_temperature(config.temperature);
    let store = FileVectorStore::open(&config.store_dir)
        .await
        .with_context(|| format!("failed to open store {}", config.store_dir.display()))?;

    info!(store_dir = %store.dir().display(), "opened vector store");

    let mut builder = QueryRouter::builder()
        .index(VectorIndex::new(embedder, Arc::new(store)))
        .generator(Arc::new(generator));
    if let Some(path) = &args.tokenizer {
        let chunker = TokenChunker::with_overlap_fraction(
            Arc::new(HuggingFaceTokenizer::from_file(path)?),
            config.max_chunk_tokens,
            config.overlap_fraction,
        )?;
        builder = builder.chunker(Arc::new(chunker));
    }
    let router = builder.config(config).build()?;

    info!(
        embedding_model = router.index().embedder().model_name(),
        generation_model = %router.config().generation_model,
        "initialized providers"
    );
    Ok(router)
}
