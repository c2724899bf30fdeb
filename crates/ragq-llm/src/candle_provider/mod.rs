pub mod embed;
pub mod generate;
pub mod loader;

pub use candle_core::Device;

use std::sync::{Arc, Mutex};

use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use tokenizers::Tokenizer;

use crate::error::LlmError;
use crate::provider::GenerationBackend;

use self::generate::{GenerationConfig, GenerationOutput, generate_seq2seq};
use self::loader::{LoadedModel, ModelSource, load_seq2seq_model};

/// Local sequence-to-sequence generation on a Candle device.
///
/// Once a generation has started on the blocking pool it runs to completion;
/// there is no cancellation path.
#[derive(Clone)]
pub struct CandleProvider {
    // The decoder keeps a KV cache, so one generation at a time per model.
    model: Arc<Mutex<T5ForConditionalGeneration>>,
    tokenizer: Arc<Tokenizer>,
    model_config: Arc<T5Config>,
    generation_config: GenerationConfig,
    device: Device,
}

impl std::fmt::Debug for CandleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandleProvider")
            .field("generation_config", &self.generation_config)
            .field("device", &format!("{:?}", self.device))
            .finish_non_exhaustive()
    }
}

impl CandleProvider {
    /// Create a new `CandleProvider` from a model source.
    ///
    /// # Errors
    ///
    /// Returns an error if model or tokenizer loading fails.
    pub fn new(
        source: &ModelSource,
        max_input_tokens: usize,
        generation_config: GenerationConfig,
        device: Device,
    ) -> Result<Self, LlmError> {
        let LoadedModel {
            model,
            tokenizer,
            config,
        } = load_seq2seq_model(source, max_input_tokens, &device)?;

        tracing::info!(?source, device = device_name(&device), "loaded local generation model");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            tokenizer: Arc::new(tokenizer),
            model_config: Arc::new(config),
            generation_config,
            device,
        })
    }

    #[must_use]
    pub fn device_name(&self) -> &'static str {
        device_name(&self.device)
    }

    fn generate_sync(&self, prompt: &str) -> Result<String, LlmError> {
        let mut model = self
            .model
            .lock()
            .map_err(|e| LlmError::Inference(format!("model lock poisoned: {e}")))?;

        let GenerationOutput {
            text,
            tokens_generated,
        } = generate_seq2seq(
            &mut model,
            &self.tokenizer,
            &self.model_config,
            prompt,
            &self.generation_config,
            &self.device,
        )?;

        tracing::debug!("generated {tokens_generated} token(s)");
        Ok(text.trim().to_owned())
    }
}

fn device_name(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

impl GenerationBackend for CandleProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let provider = self.clone();
        let prompt = prompt.to_owned();
        tokio::task::spawn_blocking(move || provider.generate_sync(&prompt))
            .await
            .map_err(|e| LlmError::Inference(format!("candle generation task failed: {e}")))?
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "candle"
    }
}
