//! Answer generator trait consumed by the query router.

use async_trait::async_trait;

use crate::error::Result;

/// Turns a fully composed prompt into a natural-language answer.
///
/// Model identity and temperature are fixed when the generator is built; they
/// are not per-call parameters. The router calls
/// [`generate`](AnswerGenerator::generate) at most once per turn and never
/// retries.
///
/// # Example
///
/// ```rust,ignore
/// use finrag::AnswerGenerator;
///
/// let answer = generator.generate(&prompt).await?;
/// ```
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer for `prompt`.
    ///
    /// Failures are reported as [`RagError::GenerationError`](crate::RagError::GenerationError).
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}
