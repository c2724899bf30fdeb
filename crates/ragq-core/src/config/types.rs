use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_corpus_source() -> String {
    "./data/corpus.jsonl".into()
}

fn default_dataset_size() -> usize {
    1000
}

fn default_min_document_chars() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    /// JSONL question/answer file, text file, or directory of documents.
    #[serde(default = "default_corpus_source")]
    pub source: String,
    /// Maximum number of source records read.
    #[serde(default = "default_dataset_size")]
    pub dataset_size: usize,
    #[serde(default = "default_min_document_chars")]
    pub min_document_chars: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source: default_corpus_source(),
            dataset_size: default_dataset_size(),
            min_document_chars: default_min_document_chars(),
        }
    }
}

fn default_chunk_size() -> usize {
    400
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_min_words() -> usize {
    10
}

/// Sizes are in characters; the chunker converts them to words.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_words: default_min_words(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

/// Embedding provider selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Ollama,
    Candle,
}

impl EmbeddingProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Candle => "candle",
        }
    }
}

impl std::fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_embedding_model() -> String {
    "all-minilm".into()
}

fn default_batch_size() -> usize {
    32
}

fn default_device() -> String {
    "cpu".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    /// Ollama model name, or a `HuggingFace` repo id / local path for candle.
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            device: default_device(),
        }
    }
}

/// Answer generation backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ollama,
    Candle,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Candle => "candle",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub candle: CandleConfig,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_ollama_model() -> String {
    "qwen2.5:0.5b".into()
}

/// The Ollama server also serves embeddings when `[embedding] provider = "ollama"`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

fn default_candle_model() -> String {
    "google/flan-t5-small".into()
}

fn default_max_input_tokens() -> usize {
    512
}

fn default_max_length() -> usize {
    512
}

fn default_temperature() -> f64 {
    0.7
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CandleConfig {
    /// `HuggingFace` repo id or local model directory.
    #[serde(default = "default_candle_model")]
    pub model: String,
    /// Prompts are truncated to this many tokens before encoding.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for CandleConfig {
    fn default() -> Self {
        Self {
            model: default_candle_model(),
            max_input_tokens: default_max_input_tokens(),
            max_length: default_max_length(),
            temperature: default_temperature(),
            seed: default_seed(),
            device: default_device(),
        }
    }
}

fn default_index_path() -> String {
    "./data/index.safetensors".into()
}

fn default_chunks_path() -> String {
    "./data/chunks.json".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_index_path")]
    pub index_path: String,
    #[serde(default = "default_chunks_path")]
    pub chunks_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            chunks_path: default_chunks_path(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}
