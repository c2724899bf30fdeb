use std::future::Future;

use crate::error::LlmError;

/// Maps text to a fixed-dimension dense vector.
///
/// The same provider (and model) must be used for building the index and for
/// embedding queries against it; nothing downstream can detect a mismatch.
/// Implementations must tolerate concurrent calls from independent tasks.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing model or service fails.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Embed several texts, preserving input order.
    ///
    /// The default implementation calls [`EmbeddingProvider::embed`] once per text.
    ///
    /// # Errors
    ///
    /// Returns the first error raised for any text.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send {
        async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        }
    }

    fn name(&self) -> &str;
}

/// Produces answer text from a fully assembled prompt.
///
/// Backends report failures as errors; converting them into visible answer
/// text is the caller's decision.
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or inference failure.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;

    fn name(&self) -> &str;
}
