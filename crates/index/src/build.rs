use std::path::{Path, PathBuf};
use std::time::Instant;

use canonical::normalize;
use catalog::Catalog;
use semantic::QueryEncoder;
use tracing::{info, warn, Instrument, Level};

use crate::cache::{encode_artifact, load_cache, write_cache};
use crate::{CacheExpectations, CacheLookup, CacheMissReason, EmbeddingIndex, IndexConfig, IndexError};

/// Where a [`LoadedIndex`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOrigin {
    CacheHit,
    /// Encoded from scratch. `persisted` is false when writing the artifact
    /// failed or caching is disabled.
    Rebuilt {
        reason: CacheMissReason,
        persisted: bool,
    },
}

#[derive(Debug)]
pub struct LoadedIndex {
    pub index: EmbeddingIndex,
    pub origin: IndexOrigin,
}

impl LoadedIndex {
    pub fn into_index(self) -> EmbeddingIndex {
        self.index
    }
}

/// Encodes every catalog entry into a fresh index.
///
/// Composites are encoded `batch_size` at a time, or all in one call when
/// `batch_size` is zero. An empty catalog yields an empty index without
/// touching the encoder.
pub async fn build_index(
    catalog: &Catalog,
    encoder: &QueryEncoder,
    batch_size: usize,
) -> Result<EmbeddingIndex, IndexError> {
    if catalog.is_empty() {
        return Ok(EmbeddingIndex::empty(encoder.model_name()));
    }

    let texts: Vec<String> = catalog
        .entries()
        .iter()
        .map(|entry| normalize(&entry.composite_text()))
        .collect();

    let chunk_len = if batch_size == 0 { texts.len() } else { batch_size };
    let mut vectors = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(chunk_len) {
        vectors.extend(encoder.encode_batch(chunk).await?);
    }

    EmbeddingIndex::new(encoder.model_name(), catalog.entries().to_vec(), vectors, texts)
}

/// Returns the cached index for `catalog` when one matches, otherwise builds
/// and persists a new one.
///
/// A `cache_path` of `None` disables caching. Persist failures are logged and
/// do not fail the call.
pub async fn build_or_load(
    catalog: &Catalog,
    encoder: &QueryEncoder,
    cache_path: Option<&Path>,
    cfg: &IndexConfig,
) -> Result<LoadedIndex, IndexError> {
    let span = tracing::span!(
        Level::INFO,
        "index.build_or_load",
        entries = catalog.len(),
        model = encoder.model_name()
    );
    load_or_rebuild(catalog, encoder, cache_path, cfg)
        .instrument(span)
        .await
}

async fn load_or_rebuild(
    catalog: &Catalog,
    encoder: &QueryEncoder,
    cache_path: Option<&Path>,
    cfg: &IndexConfig,
) -> Result<LoadedIndex, IndexError> {
    let start = Instant::now();

    let reason = match cache_path {
        Some(path) => match lookup(path, catalog, encoder).await? {
            CacheLookup::Hit(index) => {
                info!(
                    path = %path.display(),
                    entries = index.len(),
                    dim = index.dim(),
                    elapsed_micros = start.elapsed().as_micros(),
                    "index_cache_hit"
                );
                return Ok(LoadedIndex {
                    index,
                    origin: IndexOrigin::CacheHit,
                });
            }
            CacheLookup::Miss(reason) => reason,
        },
        None => CacheMissReason::Disabled,
    };

    match &reason {
        CacheMissReason::Disabled | CacheMissReason::Absent => {
            info!(reason = %reason, "index_cache_miss")
        }
        _ => warn!(reason = %reason, "index_cache_miss"),
    }

    let index = build_index(catalog, encoder, cfg.batch_size).await?;
    info!(
        entries = index.len(),
        dim = index.dim(),
        elapsed_micros = start.elapsed().as_micros(),
        "index_built"
    );

    let persisted = match cache_path {
        Some(path) => match persist(path, &index, catalog.fingerprint(), cfg).await {
            Ok(()) => {
                info!(path = %path.display(), "index_cache_persisted");
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "index_cache_persist_failure");
                false
            }
        },
        None => false,
    };

    Ok(LoadedIndex {
        index,
        origin: IndexOrigin::Rebuilt { reason, persisted },
    })
}

async fn lookup(
    path: &Path,
    catalog: &Catalog,
    encoder: &QueryEncoder,
) -> Result<CacheLookup, IndexError> {
    let path: PathBuf = path.to_path_buf();
    let model_name = encoder.model_name().to_owned();
    let fingerprint = catalog.fingerprint().to_owned();
    let entry_count = catalog.len();

    tokio::task::spawn_blocking(move || {
        load_cache(
            &path,
            CacheExpectations {
                model_name: &model_name,
                catalog_fingerprint: &fingerprint,
                entry_count,
            },
        )
    })
    .await
    .map_err(|e| IndexError::Task(e.to_string()))
}

async fn persist(
    path: &Path,
    index: &EmbeddingIndex,
    fingerprint: &str,
    cfg: &IndexConfig,
) -> Result<(), IndexError> {
    let bytes = encode_artifact(index, fingerprint, &cfg.compression)?;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_cache(&path, &bytes))
        .await
        .map_err(|e| IndexError::Task(e.to_string()))?
}
