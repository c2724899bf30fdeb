use std::str::FromStr;

use super::Config;

/// Parse `key` if set; an unparsable value is ignored with a warning.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    match v.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {v}");
            None
        }
    }
}

fn env_kind<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
        Some(kind)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RAGQ_CORPUS_SOURCE") {
            self.corpus.source = v;
        }
        if let Some(n) = env_parse("RAGQ_DATASET_SIZE") {
            self.corpus.dataset_size = n;
        }
        if let Some(n) = env_parse("RAGQ_MIN_DOCUMENT_CHARS") {
            self.corpus.min_document_chars = n;
        }
        if let Some(n) = env_parse("RAGQ_CHUNK_SIZE") {
            self.chunking.chunk_size = n;
        }
        if let Some(n) = env_parse("RAGQ_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = n;
        }
        if let Some(n) = env_parse("RAGQ_MIN_WORDS") {
            self.chunking.min_words = n;
        }
        if let Some(n) = env_parse("RAGQ_TOP_K") {
            self.retrieval.top_k = n;
        }
        if let Some(kind) = env_kind("RAGQ_EMBEDDING_PROVIDER") {
            self.embedding.provider = kind;
        }
        if let Ok(v) = std::env::var("RAGQ_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(n) = env_parse("RAGQ_EMBEDDING_BATCH_SIZE") {
            self.embedding.batch_size = n;
        }
        if let Ok(v) = std::env::var("RAGQ_EMBEDDING_DEVICE") {
            self.embedding.device = v;
        }
        if let Some(kind) = env_kind("RAGQ_LLM_BACKEND") {
            self.llm.backend = kind;
        }
        if let Ok(v) = std::env::var("RAGQ_OLLAMA_BASE_URL") {
            self.llm.ollama.base_url = v;
        }
        if let Ok(v) = std::env::var("RAGQ_OLLAMA_MODEL") {
            self.llm.ollama.model = v;
        }
        if let Ok(v) = std::env::var("RAGQ_CANDLE_MODEL") {
            self.llm.candle.model = v;
        }
        if let Some(n) = env_parse("RAGQ_CANDLE_MAX_INPUT_TOKENS") {
            self.llm.candle.max_input_tokens = n;
        }
        if let Some(n) = env_parse("RAGQ_CANDLE_MAX_LENGTH") {
            self.llm.candle.max_length = n;
        }
        if let Some(seed) = env_parse("RAGQ_CANDLE_SEED") {
            self.llm.candle.seed = seed;
        }
        if let Some(t) = env_parse("RAGQ_CANDLE_TEMPERATURE") {
            self.llm.candle.temperature = t;
        }
        if let Ok(v) = std::env::var("RAGQ_CANDLE_DEVICE") {
            self.llm.candle.device = v;
        }
        if let Ok(v) = std::env::var("RAGQ_INDEX_PATH") {
            self.storage.index_path = v;
        }
        if let Ok(v) = std::env::var("RAGQ_CHUNKS_PATH") {
            self.storage.chunks_path = v;
        }
        if let Ok(v) = std::env::var("RAGQ_LOG_LEVEL") {
            self.observability.log_level = v;
        }
    }
}
