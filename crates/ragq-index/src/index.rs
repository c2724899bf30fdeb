//! Exact nearest-neighbor index over dense vectors.
//!
//! Vectors live in one contiguous row-major buffer; position `i` is the
//! `i`-th vector passed to [`FlatIndex::build`]. Persistence goes through the
//! safetensors format as a single `(n, dim)` f32 tensor.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};

use crate::error::{IndexError, Result};

const VECTORS_KEY: &str = "vectors";

/// One search hit: index position and squared Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl FlatIndex {
    /// Empty index of the given dimensionality.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    /// Build an index from vectors; the first vector fixes the dimension.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Dimension`] if the vectors differ in length.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dim = vectors.first().map_or(0, Vec::len);
        let mut index = Self::new(dim);
        index.add(vectors)?;
        Ok(index)
    }

    /// Append vectors after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Dimension`] on the first vector whose length
    /// differs from the index dimension; nothing is appended in that case.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(IndexError::Dimension {
                expected: self.dim,
                actual: bad.len(),
            });
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend(v);
        }
        Ok(())
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dim;
        Some(&self.data[start..start + self.dim])
    }

    /// Exact search over every stored vector, best first.
    ///
    /// Ties keep insertion order. A `k` above the stored count returns all
    /// vectors; `k == 0` or an empty index returns nothing.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Dimension`] if `query` has the wrong length for a
    /// non-empty index.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(IndexError::Dimension {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(position, v)| Neighbor {
                position,
                distance: squared_l2(query, v),
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    /// Write the index as a safetensors file.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor cannot be built or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tensor = Tensor::from_slice(&self.data, (self.len(), self.dim), &Device::Cpu)?;
        let tensors = HashMap::from([(VECTORS_KEY.to_owned(), tensor)]);
        candle_core::safetensors::save(&tensors, path)?;
        tracing::debug!(path = %path.display(), vectors = self.len(), "saved index");
        Ok(())
    }

    /// Read an index written by [`FlatIndex::save`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Artifact`] if the file does not hold a 2-D
    /// `vectors` tensor, or a storage error if it cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let mut tensors = candle_core::safetensors::load(path, &Device::Cpu)?;
        let tensor = tensors
            .remove(VECTORS_KEY)
            .ok_or_else(|| IndexError::Artifact {
                path: path.display().to_string(),
                reason: format!("missing `{VECTORS_KEY}` tensor"),
            })?;
        let (n, dim) = tensor.dims2().map_err(|e| IndexError::Artifact {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let data = tensor
            .to_dtype(DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        tracing::debug!(path = %path.display(), vectors = n, dim, "loaded index");
        Ok(Self { dim, data })
    }
}
