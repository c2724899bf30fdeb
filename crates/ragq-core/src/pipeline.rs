//! Retrieve-then-generate orchestration with per-query latency and history.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use ragq_index::{Retrieval, Retriever};
use ragq_llm::{EmbeddingProvider, GenerationBackend};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generator::Generator;

/// One answered query as returned to callers and kept in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub answer: String,
    pub contexts: Vec<String>,
    pub scores: Vec<f32>,
    /// Wall time from retrieval start to answer, in whole milliseconds.
    pub latency_ms: u64,
}

/// Aggregate view over the query history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStats {
    pub queries: usize,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

/// Query pipeline over a read-only corpus.
///
/// The history grows by one entry per completed query for the lifetime of the
/// pipeline and is never trimmed.
pub struct RagPipeline<E, B> {
    retriever: Retriever<E>,
    generator: Generator<B>,
    history: Mutex<Vec<QueryResult>>,
}

impl<E, B> std::fmt::Debug for RagPipeline<E, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("retriever", &self.retriever)
            .finish_non_exhaustive()
    }
}

impl<E: EmbeddingProvider, B: GenerationBackend> RagPipeline<E, B> {
    #[must_use]
    pub fn new(retriever: Retriever<E>, generator: Generator<B>) -> Self {
        Self {
            retriever,
            generator,
            history: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn retriever(&self) -> &Retriever<E> {
        &self.retriever
    }

    #[must_use]
    pub fn generator(&self) -> &Generator<B> {
        &self.generator
    }

    /// Answer `question` from the `top_k` nearest chunks (`None` uses the
    /// retriever default).
    ///
    /// Generation failures do not fail the query; they come back as an
    /// `"Error: ..."` answer with latency recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the question cannot be embedded or searched.
    pub async fn query(&self, question: &str, top_k: Option<usize>) -> Result<QueryResult> {
        let start = Instant::now();

        let Retrieval { contexts, scores } = self.retriever.retrieve(question, top_k).await?;
        let answer = self.generator.generate(question, &contexts).await;

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(latency_ms, contexts = contexts.len(), "query answered");

        let result = QueryResult {
            question: question.to_owned(),
            answer,
            contexts,
            scores,
            latency_ms,
        };
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(result)
    }

    /// Snapshot of all completed queries, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<QueryResult> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let total: u64 = history.iter().map(|r| r.latency_ms).sum();
        let max_latency_ms = history.iter().map(|r| r.latency_ms).max().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let avg_latency_ms = if history.is_empty() {
            0.0
        } else {
            total as f64 / history.len() as f64
        };
        HistoryStats {
            queries: history.len(),
            avg_latency_ms,
            max_latency_ms,
        }
    }
}
