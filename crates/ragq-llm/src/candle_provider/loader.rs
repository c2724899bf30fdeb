use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use tokenizers::{Tokenizer, TruncationParams};

use crate::error::LlmError;

#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    Local { path: PathBuf },
    HuggingFace { repo_id: String },
}

impl ModelSource {
    /// Interpret an identifier as a local directory when it exists, otherwise as a hub repo.
    #[must_use]
    pub fn from_identifier(id: &str) -> Self {
        let path = Path::new(id);
        if path.is_dir() {
            Self::Local {
                path: path.to_path_buf(),
            }
        } else {
            Self::HuggingFace {
                repo_id: id.to_owned(),
            }
        }
    }
}

pub struct LoadedModel {
    pub model: T5ForConditionalGeneration,
    pub tokenizer: Tokenizer,
    pub config: T5Config,
}

pub(crate) struct ModelFiles {
    pub(crate) config: PathBuf,
    pub(crate) tokenizer: PathBuf,
    pub(crate) weights: PathBuf,
}

/// Load a sequence-to-sequence (T5 family) model with a truncating tokenizer.
///
/// Prompts longer than `max_input_tokens` are cut at encode time.
///
/// # Errors
///
/// Returns an error if any model file cannot be fetched or parsed.
pub fn load_seq2seq_model(
    source: &ModelSource,
    max_input_tokens: usize,
    device: &Device,
) -> Result<LoadedModel, LlmError> {
    let files = resolve_files(source)?;

    let config_str = std::fs::read_to_string(&files.config)
        .map_err(|e| LlmError::ModelLoad(format!("failed to read T5 config: {e}")))?;
    let config: T5Config = serde_json::from_str(&config_str)?;

    let mut tokenizer = load_tokenizer(&files.tokenizer)?;
    truncate_inputs(&mut tokenizer, max_input_tokens)?;

    // SAFETY: the weights file is not modified while the VarBuilder is alive.
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights], DType::F32, device)? };
    let model = T5ForConditionalGeneration::load(vb, &config)?;

    Ok(LoadedModel {
        model,
        tokenizer,
        config,
    })
}

pub(crate) fn resolve_files(source: &ModelSource) -> Result<ModelFiles, LlmError> {
    match source {
        ModelSource::Local { path } => Ok(ModelFiles {
            config: path.join("config.json"),
            tokenizer: path.join("tokenizer.json"),
            weights: path.join("model.safetensors"),
        }),
        ModelSource::HuggingFace { repo_id } => {
            let api = hf_hub::api::sync::Api::new().map_err(|e| {
                LlmError::ModelLoad(format!("failed to create HuggingFace API client: {e}"))
            })?;
            let repo = api.model(repo_id.clone());
            let fetch = |name: &str| {
                repo.get(name).map_err(|e| {
                    LlmError::ModelLoad(format!("failed to download {name} from {repo_id}: {e}"))
                })
            };
            Ok(ModelFiles {
                config: fetch("config.json")?,
                tokenizer: fetch("tokenizer.json")?,
                weights: fetch("model.safetensors")?,
            })
        }
    }
}

/// Cut encodings to at most `max_length` tokens.
pub(crate) fn truncate_inputs(tokenizer: &mut Tokenizer, max_length: usize) -> Result<(), LlmError> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| LlmError::ModelLoad(format!("failed to configure truncation: {e}")))?;
    Ok(())
}

pub(crate) fn load_tokenizer(path: &Path) -> Result<Tokenizer, LlmError> {
    Tokenizer::from_file(path).map_err(|e| {
        LlmError::ModelLoad(format!("failed to load tokenizer from {}: {e}", path.display()))
    })
}
