//! Statement embeddings from the OpenAI embeddings API (feature `openai`).
//!
//! Any server speaking the same protocol works through
//! [`OpenAIEmbeddingProvider::with_base_url`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::http::{CompatClient, api_key_from_env};

/// The OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Embedding model used unless another is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const PROVIDER: &str = "OpenAI";

/// Output size of the hosted models, used when no explicit size is set.
fn native_dimensions(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

/// An [`EmbeddingProvider`] posting chunk batches to `{base_url}/embeddings`.
///
/// The collection records [`model_name`](EmbeddingProvider::model_name) and
/// [`dimensions`](EmbeddingProvider::dimensions), so changing either after a
/// build makes the collection unusable until it is rebuilt.
pub struct OpenAIEmbeddingProvider {
    http: CompatClient,
    model: String,
    dimensions: usize,
    shortened: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for [`DEFAULT_EMBEDDING_MODEL`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: CompatClient::new(PROVIDER, api_key.into(), OPENAI_API_BASE)?,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: 1536,
            shortened: None,
        })
    }

    /// Create a provider using `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env("OPENAI_API_KEY")?)
    }

    /// Use another embedding model.
    ///
    /// Known hosted models set their native size; for other models call
    /// [`with_dimensions`](Self::with_dimensions) as well.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        if self.shortened.is_none() {
            if let Some(dims) = native_dimensions(&self.model) {
                self.dimensions = dims;
            }
        }
        self
    }

    /// Ask the API for vectors shortened to `dims` components.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.shortened = Some(dims);
        self
    }

    /// Send requests to another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.http.set_base_url(base_url.as_ref());
        self
    }

    fn embedding_error(&self, message: impl Into<String>) -> RagError {
        RagError::EmbeddingError { provider: self.http.provider().to_string(), message: message.into() }
    }

    /// Order vectors by their input index and check count and size.
    fn collect_vectors(&self, mut data: Vec<EmbeddingRow>, expected: usize) -> Result<Vec<Vec<f32>>> {
        if data.len() != expected {
            return Err(self.embedding_error(format!(
                "expected {expected} embeddings, got {}",
                data.len()
            )));
        }
        data.sort_by_key(|row| row.index);
        if let Some(row) = data.iter().find(|row| row.embedding.len() != self.dimensions) {
            return Err(self.embedding_error(format!(
                "model '{}' returned {} dimensions, expected {}",
                self.model,
                row.embedding.len(),
                self.dimensions
            )));
        }
        Ok(data.into_iter().map(|row| row.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| self.embedding_error("no embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, batch_size = texts.len(), "embedding chunks");

        let request =
            EmbeddingsRequest { model: &self.model, input: texts, dimensions: self.shortened };
        let response: EmbeddingsResponse = self
            .http
            .post_json("embeddings", &request)
            .await
            .map_err(|message| self.embedding_error(message))?;
        self.collect_vectors(response.data, texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAIEmbeddingProvider {
        OpenAIEmbeddingProvider::new("sk-test").unwrap()
    }

    #[test]
    fn hosted_models_report_native_size() {
        assert_eq!(provider().dimensions(), 1536);
        assert_eq!(provider().with_model("text-embedding-3-large").dimensions(), 3072);
        let shortened = provider().with_dimensions(256).with_model("text-embedding-3-large");
        assert_eq!(shortened.dimensions(), 256);
        assert_eq!(shortened.model_name(), "text-embedding-3-large");
    }

    #[test]
    fn request_omits_dimensions_unless_shortened() {
        let input = ["Grocery $50 debit"];
        let body = EmbeddingsRequest { model: DEFAULT_EMBEDDING_MODEL, input: &input, dimensions: None };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["input"][0], "Grocery $50 debit");
        assert!(json.get("dimensions").is_none());
    }

    #[test]
    fn vectors_follow_input_order() {
        let provider = provider().with_dimensions(2);
        let response: EmbeddingsResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        )
        .unwrap();

        let vectors = provider.collect_vectors(response.data, 2).unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn wrong_count_or_size_is_an_embedding_error() {
        let provider = provider().with_dimensions(2);
        let row = |embedding: Vec<f32>| EmbeddingRow { index: 0, embedding };

        let err = provider.collect_vectors(vec![row(vec![1.0, 0.0])], 2).unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { .. }));

        let err = provider.collect_vectors(vec![row(vec![1.0, 0.0, 0.0])], 1).unwrap_err();
        assert!(err.to_string().contains("3 dimensions"));
    }
}
