#[cfg(feature = "candle")]
use crate::candle_provider::CandleProvider;
#[cfg(feature = "candle")]
use crate::candle_provider::embed::CandleEmbedder;
use crate::error::LlmError;
#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::provider::{EmbeddingProvider, GenerationBackend};

/// Generates a match over all `AnyBackend` variants, binding the inner backend
/// and evaluating the given expression for each arm.
macro_rules! delegate_backend {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyBackend::Ollama($p) => $expr,
            #[cfg(feature = "candle")]
            AnyBackend::Candle($p) => $expr,
            #[cfg(feature = "mock")]
            AnyBackend::Mock($p) => $expr,
        }
    };
}

macro_rules! delegate_embedder {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyEmbedder::Ollama($p) => $expr,
            #[cfg(feature = "candle")]
            AnyEmbedder::Candle($p) => $expr,
            #[cfg(feature = "mock")]
            AnyEmbedder::Mock($p) => $expr,
        }
    };
}

/// Generation backend selected once at construction.
#[derive(Debug, Clone)]
pub enum AnyBackend {
    Ollama(OllamaProvider),
    #[cfg(feature = "candle")]
    Candle(CandleProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl GenerationBackend for AnyBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        delegate_backend!(self, |p| p.generate(prompt).await)
    }

    fn name(&self) -> &str {
        delegate_backend!(self, |p| GenerationBackend::name(p))
    }
}

/// Embedding provider selected once at construction.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    Ollama(OllamaProvider),
    #[cfg(feature = "candle")]
    Candle(CandleEmbedder),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl EmbeddingProvider for AnyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        delegate_embedder!(self, |p| p.embed(text).await)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        delegate_embedder!(self, |p| p.embed_batch(texts).await)
    }

    fn name(&self) -> &str {
        delegate_embedder!(self, |p| EmbeddingProvider::name(p))
    }
}
