//! Validated query entry point.

use ragq_llm::{EmbeddingProvider, GenerationBackend};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::pipeline::{QueryResult, RagPipeline};

fn default_top_k() -> i64 {
    3
}

/// Caller-supplied query, as it arrives over JSON or the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

impl QueryRequest {
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: default_top_k(),
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }

    /// Check the request and return the accepted `top_k`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for an empty or whitespace-only
    /// question and for a `top_k` that is not positive.
    pub fn validate(&self) -> Result<usize> {
        if self.question.trim().is_empty() {
            return Err(CoreError::InvalidRequest("question cannot be empty".into()));
        }
        if self.top_k <= 0 {
            return Err(CoreError::InvalidRequest(format!(
                "top_k must be positive, got {}",
                self.top_k
            )));
        }
        usize::try_from(self.top_k)
            .map_err(|_| CoreError::InvalidRequest(format!("top_k out of range: {}", self.top_k)))
    }
}

/// Validate `request` and run it through `pipeline`.
///
/// # Errors
///
/// Returns a validation error without touching the pipeline, or the
/// pipeline's retrieval error.
pub async fn answer<E, B>(pipeline: &RagPipeline<E, B>, request: &QueryRequest) -> Result<QueryResult>
where
    E: EmbeddingProvider,
    B: GenerationBackend,
{
    let top_k = request.validate()?;
    pipeline.query(&request.question, Some(top_k)).await
}
