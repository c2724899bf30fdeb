//! Embedding and answer-generation backends behind two small ports.
//!
//! [`EmbeddingProvider`] turns text into vectors for both indexing and querying;
//! [`GenerationBackend`] turns a fully assembled prompt into answer text. The
//! concrete backends are chosen once at construction through [`any::AnyBackend`]
//! and [`any::AnyEmbedder`].

pub mod any;
#[cfg(feature = "candle")]
pub mod candle_provider;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod provider;

pub use error::LlmError;
pub use provider::{EmbeddingProvider, GenerationBackend};
