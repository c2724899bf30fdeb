#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote service answered with anything other than `200 OK`.
    #[error("{0}")]
    Status(reqwest::StatusCode),

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("embedding request to {provider} failed: {message}")]
    Embedding { provider: String, message: String },

    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[cfg(feature = "candle")]
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_code_and_reason() {
        let err = LlmError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "503 Service Unavailable");
    }

    #[test]
    fn embedding_error_names_provider() {
        let err = LlmError::Embedding {
            provider: "ollama".into(),
            message: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ollama"));
        assert!(msg.contains("connection refused"));
    }
}
