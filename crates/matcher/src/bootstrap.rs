//! One-time construction of the shared [`MedicineMatcher`].

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use catalog::load_catalog_file;
use index::{build_or_load, IndexOrigin};
use semantic::{build_query_encoder, QueryEncoder};
use tokio::sync::OnceCell;
use tracing::info;

use crate::availability::RegionTable;
use crate::config::PipelineConfig;
use crate::{BootstrapError, MedicineMatcher};

impl MedicineMatcher {
    /// Builds the encoder, loads the catalog, loads or builds the index and
    /// loads the region table. Any failure is fatal.
    pub async fn bootstrap(cfg: &PipelineConfig) -> Result<Self, BootstrapError> {
        cfg.matcher.validate()?;
        let encoder = build_query_encoder(&cfg.semantic).await?;
        Self::bootstrap_with_encoder(cfg, encoder).await
    }

    /// [`bootstrap`](Self::bootstrap) with a caller-supplied encoder.
    pub async fn bootstrap_with_encoder(
        cfg: &PipelineConfig,
        encoder: QueryEncoder,
    ) -> Result<Self, BootstrapError> {
        let start = Instant::now();

        let catalog = load_catalog_file(&cfg.catalog_path)?;
        let loaded = build_or_load(&catalog, &encoder, cfg.cache_path.as_deref(), &cfg.index).await?;
        let regions = match &cfg.region_file {
            Some(path) => RegionTable::from_json_file(path)?,
            None => RegionTable::builtin(),
        };

        info!(
            entries = loaded.index.len(),
            dim = loaded.index.dim(),
            model = encoder.model_name(),
            cache_hit = loaded.origin == IndexOrigin::CacheHit,
            regions = regions.regions().len(),
            elapsed_micros = start.elapsed().as_micros(),
            "matcher_ready"
        );

        let matcher = Self::new(
            Arc::new(loaded.index),
            encoder,
            Arc::new(regions),
            cfg.matcher.clone(),
        )?;
        Ok(matcher)
    }
}

/// Lazily initialized shared matcher.
///
/// Concurrent first callers wait on a single build. A failed build leaves
/// the cell empty, so the next caller retries.
#[derive(Debug, Clone, Default)]
pub struct IndexCell {
    cell: Arc<OnceCell<Arc<MedicineMatcher>>>,
}

impl IndexCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<MedicineMatcher>> {
        self.cell.get().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get_or_bootstrap(
        &self,
        cfg: &PipelineConfig,
    ) -> Result<Arc<MedicineMatcher>, BootstrapError> {
        self.get_or_try_init(|| MedicineMatcher::bootstrap(cfg)).await
    }

    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<MedicineMatcher>, BootstrapError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MedicineMatcher, BootstrapError>>,
    {
        self.cell
            .get_or_try_init(|| async { init().await.map(Arc::new) })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use semantic::testing::KeywordEncoder;
    use semantic::SemanticConfig;

    const CATALOG: &str = r#"[
        {"drug_name": "Aspirin", "medical_condition": "headache",
         "side_effects": "stomach upset", "rating": 8.1,
         "drug_link": "https://example.org/aspirin"},
        {"drug_name": "Cetirizine", "medical_condition": "hay fever",
         "side_effects": "drowsiness"}
    ]"#;

    fn pipeline(dir: &std::path::Path) -> PipelineConfig {
        let catalog_path = dir.join("drugs.json");
        std::fs::write(&catalog_path, CATALOG).unwrap();
        PipelineConfig {
            catalog_path,
            cache_path: Some(dir.join("cache").join("index.bin")),
            semantic: SemanticConfig {
                mode: "fast".into(),
                ..SemanticConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn bootstraps_with_hashing_encoder_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = pipeline(dir.path());

        let matcher = MedicineMatcher::bootstrap(&cfg).await.unwrap();
        assert_eq!(matcher.index().len(), 2);
        assert_eq!(matcher.index().model_name(), matcher.encoder().model_name());
        assert_eq!(matcher.index().entry(0).unwrap().rating.as_deref(), Some("8.1"));
        assert!(cfg.cache_path.as_ref().unwrap().exists());

        let again = MedicineMatcher::bootstrap(&cfg).await.unwrap();
        assert_eq!(again.index(), matcher.index());
    }

    #[tokio::test]
    async fn missing_catalog_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig {
            catalog_path: dir.path().join("absent.json"),
            cache_path: None,
            ..PipelineConfig::default()
        };
        let err = MedicineMatcher::bootstrap(&cfg).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Catalog(_)));
    }

    #[tokio::test]
    async fn malformed_catalog_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("drugs.json");
        std::fs::write(&catalog_path, "{ not json").unwrap();
        let cfg = PipelineConfig {
            catalog_path,
            cache_path: None,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            MedicineMatcher::bootstrap(&cfg).await.unwrap_err(),
            BootstrapError::Catalog(_)
        ));
    }

    #[tokio::test]
    async fn invalid_region_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig {
            region_file: Some(dir.path().join("regions.json")),
            ..pipeline(dir.path())
        };
        assert!(matches!(
            MedicineMatcher::bootstrap(&cfg).await.unwrap_err(),
            BootstrapError::Regions { .. }
        ));
    }

    #[tokio::test]
    async fn custom_encoder_is_used_for_index_and_queries() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = pipeline(dir.path());
        let encoder = QueryEncoder::new(Arc::new(KeywordEncoder::new(&["headache", "fever"])), 8);

        let matcher = MedicineMatcher::bootstrap_with_encoder(&cfg, encoder).await.unwrap();
        assert_eq!(matcher.index().model_name(), "keyword-test");
        assert_eq!(matcher.index().dim(), 2);
    }

    #[tokio::test]
    async fn index_cell_builds_once_and_retries_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = pipeline(dir.path());
        let cell = IndexCell::new();
        assert!(!cell.is_ready());

        let failed = cell
            .get_or_try_init(|| async { Err(BootstrapError::Config("boom".into())) })
            .await;
        assert!(failed.is_err());
        assert!(!cell.is_ready());

        let builds = AtomicUsize::new(0);
        let (a, b) = tokio::join!(
            cell.get_or_try_init(|| async {
                builds.fetch_add(1, Ordering::SeqCst);
                MedicineMatcher::bootstrap(&cfg).await
            }),
            cell.get_or_try_init(|| async {
                builds.fetch_add(1, Ordering::SeqCst);
                MedicineMatcher::bootstrap(&cfg).await
            }),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(cell.is_ready());
        assert!(Arc::ptr_eq(&cell.get().unwrap(), &a));

        let cached = cell.get_or_bootstrap(&cfg).await.unwrap();
        assert!(Arc::ptr_eq(&cached, &a));
    }
}
