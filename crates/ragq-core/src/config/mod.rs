mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::Context;
use ragq_index::{ArtifactPaths, Chunker, ChunkerConfig};

use crate::error::CoreError;

/// Config file used when neither `--config` nor `RAGQ_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings that would fail later in a less obvious place.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), CoreError> {
        let chunking = &self.chunking;
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(CoreError::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }
        Chunker::new(&self.chunker_config())
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        if self.retrieval.top_k == 0 {
            return Err(CoreError::InvalidConfig(
                "retrieval.top_k must be positive".into(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(CoreError::InvalidConfig(
                "embedding.batch_size must be positive".into(),
            ));
        }
        if self.llm.candle.temperature < 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "llm.candle.temperature ({}) must not be negative",
                self.llm.candle.temperature
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
            min_words: self.chunking.min_words,
        }
    }

    #[must_use]
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.storage.chunks_path, &self.storage.index_path)
    }
}
