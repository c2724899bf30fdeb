//! Wiring from [`Config`] to ready-to-use components.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use ragq_index::{Chunker, Corpus, Retriever, load_documents};
use ragq_llm::any::{AnyBackend, AnyEmbedder};
use ragq_llm::ollama::OllamaProvider;

use crate::config::{BackendKind, Config, DEFAULT_CONFIG_PATH, EmbeddingProviderKind};
use crate::generator::Generator;
use crate::pipeline::RagPipeline;

/// The pipeline type produced from configuration.
pub type ConfiguredPipeline = RagPipeline<AnyEmbedder, AnyBackend>;

/// Priority: explicit path > `RAGQ_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("RAGQ_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load and validate the configuration file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or holds invalid settings.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

fn ollama_provider(config: &Config) -> anyhow::Result<OllamaProvider> {
    OllamaProvider::new(
        &config.llm.ollama.base_url,
        config.llm.ollama.model.clone(),
        config.embedding.model.clone(),
    )
    .context("failed to create Ollama client")
}

/// # Errors
///
/// Returns an error if the provider cannot be constructed or needs a
/// feature this build lacks.
pub fn create_embedder(config: &Config) -> anyhow::Result<AnyEmbedder> {
    match config.embedding.provider {
        EmbeddingProviderKind::Ollama => Ok(AnyEmbedder::Ollama(ollama_provider(config)?)),
        #[cfg(feature = "candle")]
        EmbeddingProviderKind::Candle => {
            use ragq_llm::candle_provider::embed::CandleEmbedder;
            use ragq_llm::candle_provider::loader::ModelSource;

            let device = select_device(&config.embedding.device)?;
            let source = ModelSource::from_identifier(&config.embedding.model);
            let embedder = CandleEmbedder::new(&source, &device)
                .with_context(|| format!("failed to load embedding model {}", config.embedding.model))?;
            Ok(AnyEmbedder::Candle(embedder))
        }
        #[cfg(not(feature = "candle"))]
        EmbeddingProviderKind::Candle => {
            bail!("embedding provider `candle` requires building with the `candle` feature")
        }
    }
}

/// # Errors
///
/// Returns an error if the backend cannot be constructed or needs a feature
/// this build lacks.
pub fn create_backend(config: &Config) -> anyhow::Result<AnyBackend> {
    match config.llm.backend {
        BackendKind::Ollama => Ok(AnyBackend::Ollama(ollama_provider(config)?)),
        #[cfg(feature = "candle")]
        BackendKind::Candle => {
            use ragq_llm::candle_provider::CandleProvider;
            use ragq_llm::candle_provider::generate::GenerationConfig;
            use ragq_llm::candle_provider::loader::ModelSource;

            let candle_cfg = &config.llm.candle;
            let generation = GenerationConfig {
                temperature: candle_cfg.temperature,
                max_length: candle_cfg.max_length,
                seed: candle_cfg.seed,
            };
            let device = select_device(&candle_cfg.device)?;
            let provider = CandleProvider::new(
                &ModelSource::from_identifier(&candle_cfg.model),
                candle_cfg.max_input_tokens,
                generation,
                device,
            )
            .with_context(|| format!("failed to load generation model {}", candle_cfg.model))?;
            Ok(AnyBackend::Candle(provider))
        }
        #[cfg(not(feature = "candle"))]
        BackendKind::Candle => {
            bail!("backend `candle` requires building with the `candle` feature")
        }
    }
}

/// Map a device preference (`cpu`, `cuda`, `metal`, `auto`) to a candle device.
///
/// # Errors
///
/// Returns an error if an explicitly requested accelerator is unavailable.
#[cfg(feature = "candle")]
pub fn select_device(preference: &str) -> anyhow::Result<ragq_llm::candle_provider::Device> {
    match preference {
        "metal" => {
            #[cfg(feature = "metal")]
            return Ok(ragq_llm::candle_provider::Device::new_metal(0)?);
            #[cfg(not(feature = "metal"))]
            bail!("candle compiled without metal feature");
        }
        "cuda" => {
            #[cfg(feature = "cuda")]
            return Ok(ragq_llm::candle_provider::Device::new_cuda(0)?);
            #[cfg(not(feature = "cuda"))]
            bail!("candle compiled without cuda feature");
        }
        "auto" => {
            #[cfg(feature = "metal")]
            if let Ok(device) = ragq_llm::candle_provider::Device::new_metal(0) {
                return Ok(device);
            }
            #[cfg(feature = "cuda")]
            if let Ok(device) = ragq_llm::candle_provider::Device::new_cuda(0) {
                return Ok(device);
            }
            Ok(ragq_llm::candle_provider::Device::Cpu)
        }
        _ => Ok(ragq_llm::candle_provider::Device::Cpu),
    }
}

/// Log whether the configured backend is usable; never fails.
pub async fn health_check(backend: &AnyBackend) {
    match backend {
        AnyBackend::Ollama(ollama) => match ollama.health_check().await {
            Ok(()) => tracing::info!("ollama health check passed"),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        },
        #[cfg(feature = "candle")]
        AnyBackend::Candle(candle) => {
            tracing::info!("candle backend loaded, device: {}", candle.device_name());
        }
        #[allow(unreachable_patterns)]
        _ => {}
    }
}

/// Overrides for a corpus build, usually from the command line.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub source: Option<PathBuf>,
    pub limit: Option<usize>,
}

/// Load documents, chunk, embed, and index them.
///
/// # Errors
///
/// Returns an error if the source cannot be read or embedding fails.
pub async fn build_corpus<E>(
    config: &Config,
    embedder: &E,
    options: &BuildOptions,
) -> anyhow::Result<Corpus>
where
    E: ragq_llm::EmbeddingProvider,
{
    let source = options
        .source
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.corpus.source));
    let limit = options.limit.unwrap_or(config.corpus.dataset_size);

    let documents = load_documents(&source, limit, config.corpus.min_document_chars)
        .with_context(|| format!("failed to load corpus from {}", source.display()))?;
    let chunker = Chunker::new(&config.chunker_config())?;
    let corpus = Corpus::build(&documents, &chunker, embedder, config.embedding.batch_size)
        .await
        .context("failed to build corpus index")?;
    Ok(corpus)
}

/// Load the persisted corpus artifacts named in the configuration.
///
/// # Errors
///
/// Returns an error if either artifact is missing or corrupt.
pub fn load_corpus(config: &Config) -> anyhow::Result<Corpus> {
    let paths = config.artifact_paths();
    Corpus::load(&paths).with_context(|| {
        format!(
            "failed to load corpus artifacts ({}, {}); run `ragq build` first",
            paths.chunks_path.display(),
            paths.index_path.display()
        )
    })
}

/// Assemble a pipeline over an already loaded corpus.
#[must_use]
pub fn assemble_pipeline<E, B>(
    config: &Config,
    corpus: Corpus,
    embedder: E,
    backend: B,
) -> RagPipeline<E, B>
where
    E: ragq_llm::EmbeddingProvider,
    B: ragq_llm::GenerationBackend,
{
    let retriever = Retriever::new(Arc::new(corpus), Arc::new(embedder), config.retrieval.top_k);
    RagPipeline::new(retriever, Generator::new(backend))
}

/// Load artifacts and construct the configured embedder and backend.
///
/// # Errors
///
/// Returns an error if artifacts cannot be loaded or a provider cannot be built.
pub fn open_pipeline(config: &Config) -> anyhow::Result<ConfiguredPipeline> {
    let corpus = load_corpus(config)?;
    let embedder = create_embedder(config)?;
    let backend = create_backend(config)?;
    tracing::info!(
        chunks = corpus.len(),
        embedder = %config.embedding.provider,
        backend = %config.llm.backend,
        "pipeline ready"
    );
    Ok(assemble_pipeline(config, corpus, embedder, backend))
}

#[cfg(test)]
mod tests {
    use ragq_llm::mock::MockProvider;
    use ragq_llm::{EmbeddingProvider, GenerationBackend};
    use serial_test::serial;

    use super::*;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.corpus.source = dir.join("corpus.jsonl").display().to_string();
        config.chunking.min_words = 5;
        config.storage.chunks_path = dir.join("out/chunks.json").display().to_string();
        config.storage.index_path = dir.join("out/index.safetensors").display().to_string();
        config
    }

    fn write_corpus(dir: &Path) {
        std::fs::write(
            dir.join("corpus.jsonl"),
            concat!(
                r#"{"question": "What is the capital of France?", "answer": {"value": "Paris"}}"#,
                "\n",
                r#"{"question": "Which planet is known as the red planet?", "answer": "Mars"}"#,
                "\n",
            ),
        )
        .unwrap();
    }

    #[test]
    #[serial]
    fn config_path_priority() {
        unsafe { std::env::remove_var("RAGQ_CONFIG") };
        assert_eq!(resolve_config_path(None), PathBuf::from("config/default.toml"));

        unsafe { std::env::set_var("RAGQ_CONFIG", "/etc/ragq.toml") };
        assert_eq!(resolve_config_path(None), PathBuf::from("/etc/ragq.toml"));
        assert_eq!(
            resolve_config_path(Some(Path::new("cli.toml"))),
            PathBuf::from("cli.toml")
        );
        unsafe { std::env::remove_var("RAGQ_CONFIG") };
    }

    #[test]
    #[serial]
    fn load_config_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[retrieval]\ntop_k = 0\n").unwrap();
        unsafe { std::env::remove_var("RAGQ_TOP_K") };
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn ollama_providers_from_default_config() {
        let config = Config::default();
        let embedder = create_embedder(&config).unwrap();
        let backend = create_backend(&config).unwrap();
        assert_eq!(EmbeddingProvider::name(&embedder), "ollama");
        assert_eq!(GenerationBackend::name(&backend), "ollama");
        match backend {
            AnyBackend::Ollama(p) => {
                assert_eq!(p.model(), "qwen2.5:0.5b");
                assert_eq!(p.embedding_model(), "all-minilm");
                assert_eq!(p.generate_url(), "http://localhost:11434/api/generate");
            }
            #[allow(unreachable_patterns)]
            _ => panic!("expected ollama backend"),
        }
    }

    #[cfg(not(feature = "candle"))]
    #[test]
    fn candle_selection_without_feature_is_error() {
        let mut config = Config::default();
        config.llm.backend = BackendKind::Candle;
        assert!(create_backend(&config).is_err());
        config.embedding.provider = EmbeddingProviderKind::Candle;
        assert!(create_embedder(&config).is_err());
    }

    #[cfg(feature = "candle")]
    #[test]
    fn cpu_device_selection() {
        assert!(matches!(
            select_device("cpu").unwrap(),
            ragq_llm::candle_provider::Device::Cpu
        ));
        assert!(matches!(
            select_device("unknown").unwrap(),
            ragq_llm::candle_provider::Device::Cpu
        ));
    }

    #[tokio::test]
    async fn build_save_load_query() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let config = config_in(dir.path());

        let embedder = MockProvider::default()
            .with_embedding(
                "Question: What is the capital of France? Answer: Paris",
                vec![1.0, 0.0],
            )
            .with_embedding(
                "Question: Which planet is known as the red planet? Answer: Mars",
                vec![0.0, 1.0],
            )
            .with_embedding("Which planet is red?", vec![0.1, 0.9]);

        let corpus = build_corpus(&config, &embedder, &BuildOptions::default())
            .await
            .unwrap();
        assert_eq!(corpus.len(), 2);
        corpus.save(&config.artifact_paths()).unwrap();

        let loaded = load_corpus(&config).unwrap();
        let pipeline = assemble_pipeline(
            &config,
            loaded,
            embedder,
            MockProvider::with_responses(vec!["Mars".into()]),
        );
        let result = pipeline.query("Which planet is red?", Some(1)).await.unwrap();
        assert_eq!(result.answer, "Mars");
        assert_eq!(
            result.contexts,
            vec!["Question: Which planet is known as the red planet? Answer: Mars".to_owned()]
        );
    }

    #[tokio::test]
    async fn build_options_override_limit() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let config = config_in(dir.path());
        let options = BuildOptions {
            source: None,
            limit: Some(1),
        };
        let corpus = build_corpus(&config, &MockProvider::default(), &options)
            .await
            .unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn load_corpus_without_artifacts_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_corpus(&config_in(dir.path())).unwrap_err();
        assert!(format!("{err:#}").contains("ragq build"));
    }
}
