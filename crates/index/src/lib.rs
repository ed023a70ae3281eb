//! # Medicine Embedding Index
//!
//! Holds one embedding per catalog entry and answers exhaustive cosine top-k
//! queries against them.
//!
//! ## Core Functionality
//!
//! - **Build**: [`build_index`] turns every entry into the normalized composite
//!   `name condition side_effects` and encodes the composites in batched
//!   encoder calls, never one at a time.
//! - **Cache**: [`build_or_load`] reuses a persisted artifact when its schema
//!   version, encoder model, catalog fingerprint and entry count all match,
//!   and otherwise rebuilds and rewrites it. Artifacts are bincode (serde)
//!   payloads compressed with Zstd by default.
//! - **Retrieval**: [`retrieve`] ranks every vector by cosine similarity,
//!   keeps those at or above a threshold, and returns at most `top_k`.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use catalog::{Catalog, CatalogEntry};
//! use index::{build_or_load, retrieve, IndexConfig};
//! use semantic::{HashingEncoder, QueryEncoder};
//!
//! # tokio_test::block_on(async {
//! let catalog = Catalog::from_entries(vec![
//!     CatalogEntry::new("Aspirin", "headache", "stomach upset"),
//!     CatalogEntry::new("Cetirizine", "hay fever", "drowsiness"),
//! ]);
//! let encoder = QueryEncoder::new(Arc::new(HashingEncoder::new(64, true)), 16);
//!
//! let loaded = build_or_load(&catalog, &encoder, None, &IndexConfig::default())
//!     .await
//!     .unwrap();
//! let query = encoder.encode("headache").await.unwrap();
//! let hits = retrieve(&query, &loaded.index, 1, 0.0).unwrap();
//!
//! assert_eq!(loaded.index.entry(hits[0].entry_index).unwrap().name, "Aspirin");
//! # });
//! ```

use bincode::error::EncodeError;
use semantic::SemanticError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zstd::stream::encode_all;

mod build;
pub mod cache;
mod embedding;
mod query;

pub use build::{build_index, build_or_load, IndexOrigin, LoadedIndex};
pub use cache::{CacheExpectations, CacheLookup, CacheMissReason, INDEX_SCHEMA_VERSION};
pub use embedding::EmbeddingIndex;
pub use query::{retrieve, RetrievalResult};

/// Compression codec options for the cache artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// No compression. Handy when inspecting artifacts by hand.
    None,
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level, 1-22. Higher is smaller but slower.
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }
}

/// Index build and persistence settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub compression: CompressionConfig,
    /// Entries per encoder call while building. `0` encodes the whole catalog
    /// in a single call.
    pub batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            compression: CompressionConfig::default(),
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum IndexError {
    #[error("encoder error: {0}")]
    Encoder(#[from] SemanticError),
    #[error("vector {position} has dimension {found}, expected {expected}")]
    Dimension {
        position: usize,
        expected: usize,
        found: usize,
    },
    #[error("index lengths disagree: {entries} entries, {vectors} vectors, {texts} texts")]
    LengthMismatch {
        entries: usize,
        vectors: usize,
        texts: usize,
    },
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("compression error: {0}")]
    Zstd(String),
    #[error("failed to persist index cache to {path}: {message}")]
    Persist { path: String, message: String },
    #[error("index task failed: {0}")]
    Task(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Zstd(e.to_string())
    }
}
