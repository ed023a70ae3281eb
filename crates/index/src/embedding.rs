use catalog::CatalogEntry;
use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Catalog entries paired with their vectors.
///
/// `entries`, `vectors` and `normalized_texts` always have the same length,
/// and every vector has the same width [`dim`](Self::dim). Construction
/// checks both, and nothing mutates an index afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    model_name: String,
    dim: usize,
    entries: Vec<CatalogEntry>,
    vectors: Vec<Vec<f32>>,
    normalized_texts: Vec<String>,
}

impl EmbeddingIndex {
    pub fn new(
        model_name: impl Into<String>,
        entries: Vec<CatalogEntry>,
        vectors: Vec<Vec<f32>>,
        normalized_texts: Vec<String>,
    ) -> Result<Self, IndexError> {
        let dim = vectors.first().map_or(0, Vec::len);
        let index = Self {
            model_name: model_name.into(),
            dim,
            entries,
            vectors,
            normalized_texts,
        };
        index.validate()?;
        Ok(index)
    }

    /// An index over an empty catalog. Every query against it returns nothing.
    pub fn empty(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            dim: 0,
            entries: Vec::new(),
            vectors: Vec::new(),
            normalized_texts: Vec::new(),
        }
    }

    /// Re-checks the length and width invariants. Used after decoding a
    /// persisted artifact, which bypasses [`new`](Self::new).
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.entries.len() != self.vectors.len()
            || self.entries.len() != self.normalized_texts.len()
        {
            return Err(IndexError::LengthMismatch {
                entries: self.entries.len(),
                vectors: self.vectors.len(),
                texts: self.normalized_texts.len(),
            });
        }

        if !self.vectors.is_empty() && self.dim == 0 {
            return Err(IndexError::Dimension {
                position: 0,
                expected: 1,
                found: 0,
            });
        }

        if let Some((position, vector)) = self
            .vectors
            .iter()
            .enumerate()
            .find(|(_, vector)| vector.len() != self.dim)
        {
            return Err(IndexError::Dimension {
                position,
                expected: self.dim,
                found: vector.len(),
            });
        }

        Ok(())
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Vector width. `0` only for an empty index.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn normalized_texts(&self) -> &[String] {
        &self.normalized_texts
    }
}
