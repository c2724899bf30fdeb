use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use tokenizers::Tokenizer;

use crate::error::LlmError;

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f64,
    /// Upper bound on decoded tokens, EOS excluded.
    pub max_length: usize,
    pub seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_length: 512,
            seed: 42,
        }
    }
}

impl GenerationConfig {
    /// Sampling temperature as passed to the logits processor; `None` means greedy.
    #[must_use]
    pub fn sampling_temperature(&self) -> Option<f64> {
        if self.temperature <= 0.0 {
            None
        } else {
            Some(self.temperature)
        }
    }
}

pub struct GenerationOutput {
    pub text: String,
    pub tokens_generated: usize,
}

/// Encode `prompt`, then decode autoregressively until EOS or `max_length`.
///
/// # Errors
///
/// Returns an error if tokenization, a forward pass, or decoding fails.
pub fn generate_seq2seq(
    model: &mut T5ForConditionalGeneration,
    tokenizer: &Tokenizer,
    model_config: &T5Config,
    prompt: &str,
    config: &GenerationConfig,
    device: &Device,
) -> Result<GenerationOutput, LlmError> {
    let encoding = tokenizer
        .encode(prompt, true)
        .map_err(|e| LlmError::Inference(format!("tokenizer encode failed: {e}")))?;
    let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;

    model.clear_kv_cache();
    let encoder_output = model.encode(&input_ids)?;

    let start_token = model_config
        .decoder_start_token_id
        .unwrap_or(model_config.pad_token_id);
    let start_token = u32::try_from(start_token)
        .map_err(|e| LlmError::Inference(format!("decoder start token overflow: {e}")))?;
    let eos_token = u32::try_from(model_config.eos_token_id)
        .map_err(|e| LlmError::Inference(format!("eos token overflow: {e}")))?;

    let mut logits_processor =
        LogitsProcessor::new(config.seed, config.sampling_temperature(), None);
    let mut output_ids: Vec<u32> = vec![start_token];

    for step in 0..config.max_length {
        let decoder_ids = if step == 0 || !model_config.use_cache {
            Tensor::new(output_ids.as_slice(), device)?.unsqueeze(0)?
        } else {
            let last = output_ids[output_ids.len() - 1];
            Tensor::new(&[last], device)?.unsqueeze(0)?
        };
        let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
        let next = logits_processor.sample(&logits)?;
        if next == eos_token {
            break;
        }
        output_ids.push(next);
    }
    model.clear_kv_cache();

    let generated = &output_ids[1..];
    let text = tokenizer
        .decode(generated, true)
        .map_err(|e| LlmError::Inference(format!("tokenizer decode failed: {e}")))?;

    Ok(GenerationOutput {
        text,
        tokens_generated: generated.len(),
    })
}
