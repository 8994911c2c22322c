//! # finrag
//!
//! Retrieval-augmented question answering over monthly bank statements.
//!
//! ## Overview
//!
//! A corpus directory holds one statement per month (`January.pdf`,
//! `February.pdf`, ...). Questions are answered by filling a prompt with
//! statement text and passing it to an [`AnswerGenerator`]:
//!
//! - A question naming a month uses that month's whole statement as context.
//! - Any other question uses the nearest chunks from a persistent
//!   [`VectorIndex`] built once over the whole corpus.
//!
//! ## Components
//!
//! - [`CorpusLoader`]: finds statements and extracts page texts
//! - [`TokenChunker`]: token-bounded, overlapping chunks
//! - [`EmbeddingProvider`]: text → vector ([`HashEmbeddingProvider`], `openai`)
//! - [`VectorStore`]: [`InMemoryVectorStore`], [`FileVectorStore`]
//! - [`VectorIndex`] / [`RetrieverHandle`]: build-once collections and k-NN queries
//! - [`QueryRouter`]: per-question routing, prompt composition, generation
//! - [`Session`]: line-oriented interactive turns
//!
//! ## Features
//!
//! - `pdf` (default): PDF statements via `lopdf`
//! - `openai`: OpenAI-compatible embeddings
//! - `groq`: Groq chat completions answer generator
//! - `hf-tokenizer`: Hugging Face tokenizers for chunk sizing

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filestore;
pub mod generator;
#[cfg(feature = "groq")]
pub mod groq;
#[cfg(any(feature = "openai", feature = "groq"))]
mod http;
pub mod index;
pub mod inmemory;
pub mod loader;
pub mod month;
#[cfg(feature = "openai")]
pub mod openai;
pub mod prompt;
pub mod router;
pub mod session;
pub mod tokenizer;
pub mod vectorstore;

pub use chunking::{Chunker, DEFAULT_OVERLAP_FRACTION, TokenChunker, reassemble};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::{EmbeddingProvider, HashEmbeddingProvider};
pub use error::{RagError, Result};
pub use filestore::FileVectorStore;
pub use generator::AnswerGenerator;
pub use index::{BuildOutcome, RetrieverHandle, VectorIndex};
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "pdf")]
pub use loader::PdfExtractor;
pub use loader::{CorpusLoad, CorpusLoader, PageExtractor, SkippedDocument, TextExtractor};
pub use month::Month;
pub use prompt::{PromptTemplate, TRANSACTION_COLUMNS};
pub use router::{Answer, QueryRouter, QueryRouterBuilder, Route};
pub use session::{Session, SessionInput, TurnOutcome};
#[cfg(feature = "hf-tokenizer")]
pub use tokenizer::HuggingFaceTokenizer;
pub use tokenizer::{TokenCounter, WhitespaceTokenizer};
pub use vectorstore::{CollectionInfo, VectorStore};
