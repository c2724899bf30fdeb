use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::Tokenizer;

use super::loader::{ModelSource, load_tokenizer, resolve_files, truncate_inputs};
use crate::error::LlmError;
use crate::provider::EmbeddingProvider;

const DEFAULT_MAX_POSITIONS: usize = 512;

#[derive(Deserialize)]
struct PositionLimit {
    #[serde(default = "default_max_positions")]
    max_position_embeddings: usize,
}

fn default_max_positions() -> usize {
    DEFAULT_MAX_POSITIONS
}

/// Longest token sequence the encoder accepts, read from its `config.json`.
fn max_positions(config_json: &str) -> Result<usize, LlmError> {
    let limit: PositionLimit = serde_json::from_str(config_json)?;
    Ok(limit.max_position_embeddings)
}

/// Sentence-transformers style BERT encoder: mean pooling then L2 normalization.
#[derive(Clone)]
pub struct EmbedModel {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
}

impl std::fmt::Debug for EmbedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedModel")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl EmbedModel {
    /// Load a BERT embedding model from a local directory or the `HuggingFace` Hub.
    ///
    /// # Errors
    ///
    /// Returns an error if model download or loading fails.
    pub fn load(source: &ModelSource, device: &Device) -> Result<Self, LlmError> {
        let files = resolve_files(source)?;

        let config_str = std::fs::read_to_string(&files.config)
            .map_err(|e| LlmError::ModelLoad(format!("failed to read BERT config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_str)?;

        // Longer inputs would index past the position embedding table.
        let mut tokenizer = load_tokenizer(&files.tokenizer)?;
        truncate_inputs(&mut tokenizer, max_positions(&config_str)?)?;

        // SAFETY: the weights file is not modified while the VarBuilder is alive.
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights], DType::F32, device)? };

        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device: device.clone(),
        })
    }

    /// Generate a normalized embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if tokenization or the model forward pass fails.
    pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| LlmError::Inference(format!("tokenizer encode failed: {e}")))?;

        let token_ids = encoding.get_ids();
        let token_type_ids: Vec<u32> = vec![0; token_ids.len()];

        let input_ids = Tensor::new(token_ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(token_type_ids.as_slice(), &self.device)?.unsqueeze(0)?;

        let embeddings = self.model.forward(&input_ids, &token_type_ids, None)?;

        // Mean pooling over sequence dimension
        let seq_len = embeddings.dim(1)?;
        let sum = embeddings.sum(1)?;
        let mean_pooled = (sum
            / f64::from(
                u32::try_from(seq_len)
                    .map_err(|e| LlmError::Inference(format!("sequence length overflow: {e}")))?,
            ))?;

        let norm = mean_pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = mean_pooled.broadcast_div(&norm)?.squeeze(0)?;

        normalized.to_vec1::<f32>().map_err(LlmError::Candle)
    }
}

/// [`EmbeddingProvider`] running an [`EmbedModel`] on the blocking pool.
#[derive(Debug, Clone)]
pub struct CandleEmbedder {
    model: EmbedModel,
}

impl CandleEmbedder {
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded.
    pub fn new(source: &ModelSource, device: &Device) -> Result<Self, LlmError> {
        Ok(Self {
            model: EmbedModel::load(source, device)?,
        })
    }
}

impl EmbeddingProvider for CandleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let model = self.model.clone();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || model.embed_sync(&text))
            .await
            .map_err(|e| LlmError::Inference(format!("candle embedding task failed: {e}")))?
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let model = self.model.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|text| model.embed_sync(text))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| LlmError::Inference(format!("candle embedding task failed: {e}")))?
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "candle"
    }
}
