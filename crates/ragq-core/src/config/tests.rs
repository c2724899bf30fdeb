use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 24] = [
    "RAGQ_CORPUS_SOURCE",
    "RAGQ_DATASET_SIZE",
    "RAGQ_MIN_DOCUMENT_CHARS",
    "RAGQ_MIN_WORDS",
    "RAGQ_EMBEDDING_DEVICE",
    "RAGQ_CANDLE_MAX_INPUT_TOKENS",
    "RAGQ_CANDLE_SEED",
    "RAGQ_CHUNK_SIZE",
    "RAGQ_CHUNK_OVERLAP",
    "RAGQ_TOP_K",
    "RAGQ_EMBEDDING_PROVIDER",
    "RAGQ_EMBEDDING_MODEL",
    "RAGQ_EMBEDDING_BATCH_SIZE",
    "RAGQ_LLM_BACKEND",
    "RAGQ_OLLAMA_BASE_URL",
    "RAGQ_OLLAMA_MODEL",
    "RAGQ_CANDLE_MODEL",
    "RAGQ_CANDLE_MAX_LENGTH",
    "RAGQ_CANDLE_TEMPERATURE",
    "RAGQ_CANDLE_DEVICE",
    "RAGQ_INDEX_PATH",
    "RAGQ_CHUNKS_PATH",
    "RAGQ_LOG_LEVEL",
    "RAGQ_CONFIG",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.corpus.source, "./data/corpus.jsonl");
    assert_eq!(config.corpus.dataset_size, 1000);
    assert_eq!(config.corpus.min_document_chars, 20);
    assert_eq!(config.chunking.chunk_size, 400);
    assert_eq!(config.chunking.chunk_overlap, 50);
    assert_eq!(config.chunking.min_words, 10);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
    assert_eq!(config.embedding.model, "all-minilm");
    assert_eq!(config.embedding.batch_size, 32);
    assert_eq!(config.llm.backend, BackendKind::Ollama);
    assert_eq!(config.llm.ollama.base_url, "http://localhost:11434");
    assert_eq!(config.llm.ollama.model, "qwen2.5:0.5b");
    assert_eq!(config.llm.candle.model, "google/flan-t5-small");
    assert_eq!(config.llm.candle.max_length, 512);
    assert!((config.llm.candle.temperature - 0.7).abs() < f64::EPSILON);
    assert_eq!(config.storage.index_path, "./data/index.safetensors");
    assert_eq!(config.storage.chunks_path, "./data/chunks.json");
    assert_eq!(config.observability.log_level, "info");
    config.validate().unwrap();
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.retrieval.top_k, 3);
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[corpus]
source = "./docs"
dataset_size = 50

[chunking]
chunk_size = 200
chunk_overlap = 20

[retrieval]
top_k = 5

[llm]
backend = "candle"

[llm.ollama]
base_url = "http://custom:1234"

[llm.candle]
max_length = 64
temperature = 0.0
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.corpus.source, "./docs");
    assert_eq!(config.corpus.dataset_size, 50);
    assert_eq!(config.corpus.min_document_chars, 20);
    assert_eq!(config.chunking.chunk_size, 200);
    assert_eq!(config.chunking.chunk_overlap, 20);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.llm.backend, BackendKind::Candle);
    assert_eq!(config.llm.ollama.base_url, "http://custom:1234");
    assert_eq!(config.llm.ollama.model, "qwen2.5:0.5b");
    assert_eq!(config.llm.candle.max_length, 64);
    assert_eq!(config.embedding.model, "all-minilm");
}

#[test]
#[serial]
fn malformed_toml_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[retrieval\ntop_k = ").unwrap();
    clear_env();
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn unknown_backend_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[llm]\nbackend = \"openai\"\n").unwrap();
    clear_env();
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("RAGQ_OLLAMA_MODEL", "llama3.2:1b");
        std::env::set_var("RAGQ_TOP_K", "7");
        std::env::set_var("RAGQ_LLM_BACKEND", "candle");
        std::env::set_var("RAGQ_CANDLE_TEMPERATURE", "0.2");
        std::env::set_var("RAGQ_INDEX_PATH", "/tmp/idx.safetensors");
    };
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.llm.ollama.model, "llama3.2:1b");
    assert_eq!(config.retrieval.top_k, 7);
    assert_eq!(config.llm.backend, BackendKind::Candle);
    assert!((config.llm.candle.temperature - 0.2).abs() < f64::EPSILON);
    assert_eq!(config.storage.index_path, "/tmp/idx.safetensors");
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("RAGQ_TOP_K", "many");
        std::env::set_var("RAGQ_LLM_BACKEND", "gpt");
        std::env::set_var("RAGQ_CHUNK_SIZE", "-4");
    };
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.llm.backend, BackendKind::Ollama);
    assert_eq!(config.chunking.chunk_size, 400);
}

#[test]
#[serial]
fn env_overrides_cover_limits_and_devices() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("RAGQ_MIN_DOCUMENT_CHARS", "5");
        std::env::set_var("RAGQ_MIN_WORDS", "3");
        std::env::set_var("RAGQ_EMBEDDING_DEVICE", "cuda");
        std::env::set_var("RAGQ_CANDLE_MAX_INPUT_TOKENS", "256");
        std::env::set_var("RAGQ_CANDLE_SEED", "7");
    };
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.corpus.min_document_chars, 5);
    assert_eq!(config.chunking.min_words, 3);
    assert_eq!(config.embedding.device, "cuda");
    assert_eq!(config.llm.candle.max_input_tokens, 256);
    assert_eq!(config.llm.candle.seed, 7);
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
#[serial]
fn invalid_env_value_is_reported() {
    clear_env();
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    unsafe { std::env::set_var("RAGQ_TOP_K", "abc") };
    let config = tracing::subscriber::with_default(subscriber, || {
        Config::load(Path::new("/nonexistent/ragq.toml")).unwrap()
    });
    clear_env();

    assert_eq!(config.retrieval.top_k, 3);
    let output = logs.contents();
    assert!(output.contains("WARN"), "{output}");
    assert!(
        output.contains("ignoring invalid RAGQ_TOP_K value: abc"),
        "{output}"
    );
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    std::fs::write(&path, "[retrieval]\ntop_k = 5\n").unwrap();

    clear_env();
    unsafe { std::env::set_var("RAGQ_TOP_K", "9") };
    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.retrieval.top_k, 9);
}

#[test]
fn validate_rejects_overlap_not_below_size() {
    let mut config = Config::default();
    config.chunking.chunk_overlap = 400;
    assert!(matches!(
        config.validate(),
        Err(CoreError::InvalidConfig(msg)) if msg.contains("chunk_overlap")
    ));
}

#[test]
fn validate_rejects_window_without_stride() {
    let mut config = Config::default();
    // 3 chars -> 0 words per window
    config.chunking.chunk_size = 3;
    config.chunking.chunk_overlap = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_zero_top_k() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_zero_batch_size() {
    let mut config = Config::default();
    config.embedding.batch_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_negative_temperature() {
    let mut config = Config::default();
    config.llm.candle.temperature = -0.1;
    assert!(config.validate().is_err());
}

#[test]
fn chunker_config_and_paths_follow_settings() {
    let mut config = Config::default();
    config.chunking.chunk_size = 80;
    config.storage.chunks_path = "out/c.json".into();
    let chunker = config.chunker_config();
    assert_eq!(chunker.window_words(), 20);
    assert_eq!(chunker.overlap_words(), 12);
    let paths = config.artifact_paths();
    assert_eq!(paths.chunks_path, std::path::PathBuf::from("out/c.json"));
    assert_eq!(
        paths.index_path,
        std::path::PathBuf::from("./data/index.safetensors")
    );
}

#[test]
fn storage_section_holds_only_artifact_paths() {
    let rendered = toml::to_string(&Config::default()).unwrap();
    let storage: toml::Table = toml::from_str(&rendered).unwrap();
    let keys: Vec<&str> = storage["storage"]
        .as_table()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["chunks_path", "index_path"]);
}

#[test]
fn kinds_display_lowercase() {
    assert_eq!(BackendKind::Candle.to_string(), "candle");
    assert_eq!(EmbeddingProviderKind::Ollama.to_string(), "ollama");
}
