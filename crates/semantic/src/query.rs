use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

use crate::{Encoder, SemanticError};

type EmbeddingCache = LruCache<String, Arc<[f32]>>;

/// The single encoder handle shared by index construction, query encoding
/// and the allergy risk check.
///
/// Cloning is cheap and every clone shares the same underlying encoder and
/// cache, so vectors from any clone live in the same space. Single-text
/// encodings are memoized in a small LRU. The cache lock is only held for
/// lookup and insert, never across an encoder call.
#[derive(Clone)]
pub struct QueryEncoder {
    inner: Arc<dyn Encoder>,
    cache: Option<Arc<Mutex<EmbeddingCache>>>,
}

impl std::fmt::Debug for QueryEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEncoder")
            .field("model_name", &self.inner.model_name())
            .field("cached", &self.cached_len())
            .finish()
    }
}

impl QueryEncoder {
    /// Wraps `inner`. A `cache_capacity` of zero disables memoization.
    pub fn new(inner: Arc<dyn Encoder>, cache_capacity: usize) -> Self {
        let cache = NonZeroUsize::new(cache_capacity)
            .map(|capacity| Arc::new(Mutex::new(LruCache::new(capacity))));
        Self { inner, cache }
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    /// Encodes one text, serving repeats from the cache.
    pub async fn encode(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = lock(cache).get(text) {
                trace!(len = text.len(), "embedding_cache_hit");
                return Ok(hit.to_vec());
            }
        }

        let vector = self.inner.encode(text).await?;

        if let Some(cache) = &self.cache {
            lock(cache).put(text.to_owned(), Arc::from(vector.as_slice()));
        }
        Ok(vector)
    }

    /// Encodes a batch in a single encoder call. Batches bypass the cache.
    pub async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let vectors = self.inner.encode_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(SemanticError::Inference(format!(
                "encoder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| lock(cache).len())
    }
}

/// A panic while holding the lock cannot leave the LRU half-updated in a way
/// that matters here, so poisoning is ignored.
fn lock(cache: &Mutex<EmbeddingCache>) -> MutexGuard<'_, EmbeddingCache> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
