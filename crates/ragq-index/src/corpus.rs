//! Chunk sequence plus its vector index, built once and persisted together.

use std::path::{Path, PathBuf};

use ragq_llm::EmbeddingProvider;

use crate::chunker::{Chunk, Chunker};
use crate::error::{IndexError, Result};
use crate::index::FlatIndex;
use crate::loader::Document;

/// Locations of the two build artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub chunks_path: PathBuf,
    pub index_path: PathBuf,
}

impl ArtifactPaths {
    #[must_use]
    pub fn new(chunks_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            chunks_path: chunks_path.into(),
            index_path: index_path.into(),
        }
    }

    #[must_use]
    pub fn exist(&self) -> bool {
        self.chunks_path.is_file() && self.index_path.is_file()
    }
}

/// Chunks and vectors where index position `i` identifies chunk `i`.
///
/// Read-only after construction; share it behind an `Arc` across queries.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    chunks: Vec<Chunk>,
    index: FlatIndex,
}

impl Corpus {
    #[must_use]
    pub fn new(chunks: Vec<Chunk>, index: FlatIndex) -> Self {
        Self { chunks, index }
    }

    /// Chunk every document, embed the chunks in batches, and index the vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails, a batch comes back with the wrong
    /// number of vectors, or vector dimensions disagree.
    pub async fn build<E: EmbeddingProvider>(
        documents: &[Document],
        chunker: &Chunker,
        embedder: &E,
        batch_size: usize,
    ) -> Result<Self> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| chunker.chunk(&doc.text, doc.doc_id))
            .collect();
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "chunked corpus"
        );

        let mut index: Option<FlatIndex> = None;
        let batch_size = batch_size.max(1);
        let batches = chunks.len().div_ceil(batch_size);

        for (i, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(IndexError::CountMismatch {
                    chunks: texts.len(),
                    vectors: vectors.len(),
                });
            }
            match index.as_mut() {
                Some(index) => index.add(vectors)?,
                None => index = Some(FlatIndex::build(vectors)?),
            }
            tracing::debug!(batch = i + 1, of = batches, "embedded batch");
        }

        let index = index.unwrap_or_default();
        // Zero-length embeddings leave every vector unaddressable.
        if index.len() != chunks.len() {
            return Err(IndexError::CountMismatch {
                chunks: chunks.len(),
                vectors: index.len(),
            });
        }
        tracing::info!(
            vectors = index.len(),
            dim = index.dim(),
            provider = embedder.name(),
            "built index"
        );
        Ok(Self { chunks, index })
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[must_use]
    pub fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    #[must_use]
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Write the chunks as a JSON array and the index as safetensors.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or a file cannot be written.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        for path in [&paths.chunks_path, &paths.index_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&paths.chunks_path, serde_json::to_vec(&self.chunks)?)?;
        self.index.save(&paths.index_path)?;
        tracing::info!(
            chunks = %paths.chunks_path.display(),
            index = %paths.index_path.display(),
            "saved corpus artifacts"
        );
        Ok(())
    }

    /// Load both artifacts written by [`Corpus::save`].
    ///
    /// A chunk count that differs from the vector count is logged and
    /// tolerated; retrieval skips positions with no chunk.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Artifact`] if either file is missing, or a parse
    /// error if either is corrupt.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        for path in [&paths.chunks_path, &paths.index_path] {
            require_file(path)?;
        }
        let chunks: Vec<Chunk> = serde_json::from_slice(&std::fs::read(&paths.chunks_path)?)?;
        let index = FlatIndex::load(&paths.index_path)?;

        if chunks.len() != index.len() {
            tracing::warn!(
                chunks = chunks.len(),
                vectors = index.len(),
                "chunk and vector counts differ"
            );
        }
        tracing::info!(chunks = chunks.len(), dim = index.dim(), "loaded corpus artifacts");
        Ok(Self { chunks, index })
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(IndexError::Artifact {
            path: path.display().to_string(),
            reason: "file not found".into(),
        })
    }
}
