use std::sync::Arc;

use ragq_llm::EmbeddingProvider;

use crate::corpus::Corpus;
use crate::error::Result;

/// Map a squared L2 distance onto `(0, 1]`; exactly 1 at distance 0.
#[must_use]
pub fn similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Retrieved chunk texts with their similarity scores, best first.
///
/// `contexts` and `scores` always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
    pub contexts: Vec<String>,
    pub scores: Vec<f32>,
}

impl Retrieval {
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

pub struct Retriever<E> {
    corpus: Arc<Corpus>,
    embedder: Arc<E>,
    default_top_k: usize,
}

impl<E> Clone for Retriever<E> {
    fn clone(&self) -> Self {
        Self {
            corpus: Arc::clone(&self.corpus),
            embedder: Arc::clone(&self.embedder),
            default_top_k: self.default_top_k,
        }
    }
}

impl<E> std::fmt::Debug for Retriever<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("chunks", &self.corpus.len())
            .field("default_top_k", &self.default_top_k)
            .finish_non_exhaustive()
    }
}

impl<E: EmbeddingProvider> Retriever<E> {
    /// `embedder` must be the provider the corpus was built with.
    #[must_use]
    pub fn new(corpus: Arc<Corpus>, embedder: Arc<E>, default_top_k: usize) -> Self {
        Self {
            corpus,
            embedder,
            default_top_k,
        }
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[must_use]
    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Embed `query` and return up to `top_k` nearest chunks.
    ///
    /// `None` uses the configured default. Index positions with no matching
    /// chunk are skipped, so fewer than `top_k` results may come back.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be embedded or its dimension does
    /// not match the index.
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Retrieval> {
        let top_k = top_k.unwrap_or(self.default_top_k);
        if top_k == 0 || self.corpus.index().is_empty() {
            return Ok(Retrieval::default());
        }

        let vector = self.embedder.embed(query).await?;
        let neighbors = self.corpus.index().search(&vector, top_k)?;

        let mut retrieval = Retrieval::default();
        for neighbor in neighbors {
            let Some(chunk) = self.corpus.chunk(neighbor.position) else {
                tracing::debug!(position = neighbor.position, "skipping position with no chunk");
                continue;
            };
            retrieval.contexts.push(chunk.text.clone());
            retrieval.scores.push(similarity(neighbor.distance));
        }

        tracing::debug!(top_k, retrieved = retrieval.len(), "retrieved contexts");
        Ok(retrieval)
    }
}

#[cfg(test)]
mod tests {
    use ragq_llm::mock::MockProvider;

    use super::*;
    use crate::chunker::{Chunk, Chunker, ChunkerConfig};
    use crate::index::FlatIndex;
    use crate::loader::Document;

    const FRANCE: &str = "Question: What is the capital of France? Answer: Paris";

    fn chunk(i: u64, text: &str) -> Chunk {
        Chunk {
            text: text.into(),
            doc_id: i,
            chunk_id: format!("{i}_0"),
        }
    }

    fn three_chunk_corpus() -> Corpus {
        Corpus::new(
            vec![chunk(0, "alpha"), chunk(1, "beta"), chunk(2, "gamma")],
            FlatIndex::build(vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![3.0, 0.0]]).unwrap(),
        )
    }

    fn retriever(corpus: Corpus, embedder: MockProvider) -> Retriever<MockProvider> {
        Retriever::new(Arc::new(corpus), Arc::new(embedder), 3)
    }

    #[test]
    fn similarity_is_one_at_zero() {
        assert!((similarity(0.0) - 1.0).abs() < f32::EPSILON);
        assert!((similarity(1.0) - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn single_document_scenario() {
        let chunker = Chunker::new(&ChunkerConfig {
            min_words: 5,
            ..ChunkerConfig::default()
        })
        .unwrap();
        let embedder = MockProvider::default()
            .with_embedding(FRANCE, vec![0.6, 0.8])
            .with_embedding("capital of France", vec![0.6, 0.8]);
        let docs = [Document {
            doc_id: 0,
            text: FRANCE.into(),
        }];
        let corpus = Corpus::build(&docs, &chunker, &embedder, 32).await.unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.index().len(), 1);

        let retrieval = retriever(corpus, embedder)
            .retrieve("capital of France", Some(1))
            .await
            .unwrap();
        assert_eq!(retrieval.contexts, vec![FRANCE.to_owned()]);
        assert!((retrieval.scores[0] - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn results_are_ordered_with_scores() {
        let embedder = MockProvider::default().with_embedding("q", vec![0.0, 0.0]);
        let retrieval = retriever(three_chunk_corpus(), embedder)
            .retrieve("q", None)
            .await
            .unwrap();
        assert_eq!(retrieval.contexts, vec!["alpha", "beta", "gamma"]);
        assert!((retrieval.scores[0] - 1.0).abs() < f32::EPSILON);
        assert!((retrieval.scores[1] - 0.5).abs() < f32::EPSILON);
        assert!((retrieval.scores[2] - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn default_top_k_applies() {
        let embedder = MockProvider::default().with_embedding("q", vec![0.0, 0.0]);
        let retriever = Retriever::new(Arc::new(three_chunk_corpus()), Arc::new(embedder), 2);
        assert_eq!(retriever.retrieve("q", None).await.unwrap().len(), 2);
        assert_eq!(retriever.retrieve("q", Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn top_k_zero_is_empty() {
        let embedder = MockProvider::default().with_embedding("q", vec![0.0, 0.0]);
        let retrieval = retriever(three_chunk_corpus(), embedder)
            .retrieve("q", Some(0))
            .await
            .unwrap();
        assert!(retrieval.is_empty());
        assert!(retrieval.scores.is_empty());
    }

    #[tokio::test]
    async fn top_k_beyond_count_returns_all() {
        let embedder = MockProvider::default().with_embedding("q", vec![0.0, 0.0]);
        let retrieval = retriever(three_chunk_corpus(), embedder)
            .retrieve("q", Some(50))
            .await
            .unwrap();
        assert_eq!(retrieval.len(), 3);
    }

    #[tokio::test]
    async fn empty_index_returns_nothing_without_embedding() {
        let retrieval = retriever(Corpus::default(), MockProvider::failing_embeddings())
            .retrieve("anything", Some(3))
            .await
            .unwrap();
        assert!(retrieval.is_empty());
    }

    #[tokio::test]
    async fn positions_without_chunks_are_skipped() {
        let corpus = Corpus::new(
            vec![chunk(0, "alpha")],
            FlatIndex::build(vec![vec![5.0], vec![0.0], vec![1.0]]).unwrap(),
        );
        let embedder = MockProvider::default().with_embedding("q", vec![0.0]);
        let retrieval = retriever(corpus, embedder)
            .retrieve("q", Some(3))
            .await
            .unwrap();
        assert_eq!(retrieval.contexts, vec!["alpha"]);
        assert_eq!(retrieval.scores.len(), 1);
        assert!((retrieval.scores[0] - 1.0 / 26.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let result = retriever(three_chunk_corpus(), MockProvider::failing_embeddings())
            .retrieve("q", None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_error() {
        let embedder = MockProvider::default().with_embedding("q", vec![0.0, 0.0, 0.0]);
        let result = retriever(three_chunk_corpus(), embedder)
            .retrieve("q", None)
            .await;
        assert!(result.is_err());
    }

    mod proptest_similarity {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bounded(d in 0.0f32..1.0e6) {
                let s = similarity(d);
                prop_assert!(s > 0.0 && s <= 1.0);
            }

            #[test]
            fn strictly_decreasing(a in 0.0f32..1.0e3, delta in 1.0e-2f32..1.0e3) {
                prop_assert!(similarity(a + delta) < similarity(a));
            }
        }
    }
}
