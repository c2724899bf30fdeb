//! Error types for ragq-index.

/// Errors that can occur while building, persisting, or querying the corpus.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading or writing artifacts and corpus sources.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tensor or safetensors error in the index file.
    #[error("index storage error: {0}")]
    Storage(#[from] candle_core::Error),

    /// Embedding provider error.
    #[error("LLM error: {0}")]
    Llm(#[from] ragq_llm::LlmError),

    /// Chunk overlap leaves no forward progress.
    #[error("invalid chunking: window of {window} words with overlap {overlap} has no stride")]
    InvalidChunking { window: usize, overlap: usize },

    /// Vector length differs from the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    /// Embedding count differs from chunk count during a build.
    #[error("embedding count mismatch: {chunks} chunks, {vectors} vectors")]
    CountMismatch { chunks: usize, vectors: usize },

    /// Artifact file is missing or malformed.
    #[error("invalid artifact {path}: {reason}")]
    Artifact { path: String, reason: String },

    /// Unsupported corpus source.
    #[error("unsupported corpus source: {0}")]
    UnsupportedSource(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
