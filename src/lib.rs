//! Workspace umbrella crate for allergy-aware semantic medicine search.
//!
//! Re-exports the pipeline crates so callers can depend on one crate:
//!
//! - [`canonical`]: text cleaning and fingerprints
//! - [`catalog`]: catalog loading with a repair fallback
//! - [`semantic`]: encoders and the shared [`QueryEncoder`]
//! - [`index`]: the cached embedding index and cosine retrieval
//! - [`matcher`]: the search service
//!
//! The HTTP server lives in the `medsearch-server` crate.
//!
//! ```rust,no_run
//! use medsearch::{MedicineMatcher, MedicineQuery, PipelineConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let matcher = MedicineMatcher::bootstrap(&PipelineConfig::default()).await?;
//! let results = matcher
//!     .search_medicines(&MedicineQuery::new("headache", "penicillin").with_region("NY"))
//!     .await?;
//! for candidate in results {
//!     println!("{} {:.3}", candidate.entry.name, candidate.confidence);
//! }
//! # Ok(())
//! # }
//! ```

pub use canonical;
pub use catalog;
pub use index;
pub use matcher;
pub use semantic;

pub use catalog::{load_catalog, load_catalog_file, Catalog, CatalogEntry, CatalogError};
pub use index::{build_or_load, retrieve, EmbeddingIndex, IndexConfig, IndexError, IndexOrigin};
pub use matcher::{
    set_search_metrics, BootstrapError, IndexCell, MatchError, MatcherConfig, MedicineMatcher,
    MedicineQuery, NlpMatch, PipelineConfig, RegionTable, ScoredCandidate, SearchMetrics,
};
pub use semantic::{build_query_encoder, Encoder, QueryEncoder, SemanticConfig, SemanticError};
