//! Error types for the `finrag` crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::month::Month;

/// Errors that can occur while ingesting statements or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// A statement document could not be read or parsed.
    #[error("Failed to load document {}: {message}", path.display())]
    DocumentLoadError {
        /// The file that failed to load.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A named document does not exist in the corpus directory.
    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The corpus directory held no loadable documents.
    #[error("No loadable documents in corpus directory {}", .0.display())]
    EmptyCorpus(PathBuf),

    /// A collection was looked up before it was built.
    #[error("Collection '{0}' does not exist")]
    CollectionNotFound(String),

    /// A collection was built with a different embedding model than the one querying it.
    #[error(
        "Collection '{collection}' was built with embedding model '{found}', but '{expected}' is configured"
    )]
    EmbeddingModelMismatch {
        /// The collection name.
        collection: String,
        /// The configured embedding model (and dimension).
        expected: String,
        /// The embedding model recorded in the collection.
        found: String,
    },

    /// The question named a month that has no statement in the corpus.
    #[error("No document found for {month}.")]
    NoDocumentForMonth {
        /// The month named in the question.
        month: Month,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// The answer generator failed or timed out.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error, including missing credentials.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Filesystem failure outside document parsing.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for finrag operations.
pub type Result<T> = std::result::Result<T, RagError>;
