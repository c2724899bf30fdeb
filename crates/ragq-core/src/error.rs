/// Errors surfaced by the query pipeline and its entry points.
///
/// Generation failures never appear here: the generator turns them into
/// answer text.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Index(#[from] ragq_index::IndexError),

    #[error(transparent)]
    Llm(#[from] ragq_llm::LlmError),

    /// Caller input rejected before reaching the pipeline.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
