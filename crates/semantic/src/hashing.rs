use async_trait::async_trait;
use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::{Encoder, SemanticConfig, SemanticError};

/// Buckets each token is spread over. More probes make a single bucket
/// collision between unrelated tokens contribute less similarity.
const PROBES: u8 = 4;

/// Deterministic signed feature-hashing encoder.
///
/// Each lowercased alphanumeric token adds `+1` or `-1` to [`PROBES`] buckets
/// chosen by hashing the token. Texts sharing vocabulary end up close, texts
/// with disjoint vocabulary are close to orthogonal, and the empty text maps
/// to the zero vector. There is no notion of synonymy, so this back end is
/// meant for offline runs and tests rather than production ranking.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    model_name: String,
    dim: usize,
    normalize: bool,
}

impl HashingEncoder {
    pub fn new(dim: usize, normalize: bool) -> Self {
        let dim = dim.max(1);
        Self {
            model_name: format!("feature-hashing-{dim}"),
            dim,
            normalize,
        }
    }

    pub fn from_config(cfg: &SemanticConfig) -> Self {
        Self::new(cfg.hashing_dim(), cfg.normalize)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Synchronous core shared by both trait methods.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            for probe in 0..PROBES {
                let h = hash64(&(probe, token));
                let bucket = (h % self.dim as u64) as usize;
                let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
                v[bucket] += sign;
            }
        }
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        v
    }
}

#[async_trait]
impl Encoder for HashingEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        Ok(self.embed(text))
    }
}
