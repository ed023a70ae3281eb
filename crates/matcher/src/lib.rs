//! # Medicine Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the catalog, encoder and index crates and turns
//! natural-language requests into ranked, allergy-filtered medicine lists.
//!
//! A request flows through:
//! - the shared [`QueryEncoder`](semantic::QueryEncoder), which embeds the
//!   query text in the same space as the index;
//! - [`index::retrieve`], exhaustive cosine top-k with a confidence threshold;
//! - the [`RiskFilter`], which drops candidates whose side effects read like
//!   the stated allergy;
//! - [`annotate`], which marks regional pharmacy availability.
//!
//! ## Core Types
//!
//! - [`MedicineMatcher`]: the immutable search service. Build it once with
//!   [`MedicineMatcher::bootstrap`] (or lazily through [`IndexCell`]) and
//!   share it behind an `Arc`.
//! - [`MedicineQuery`] / [`ScoredCandidate`]: allergy-aware search in and out.
//! - [`NlpMatch`]: free-text search output.
//! - [`PipelineConfig`] / [`MatcherConfig`]: startup and tuning config.
//!
//! ## Allergy filtering is best effort
//!
//! The allergy check compares two free-text strings with a general sentence
//! encoder. It can miss a real conflict and can exclude a safe medicine. It
//! is a convenience filter, not a safety certification.
//!
//! ## Observability
//!
//! Every search runs in a tracing span and logs a completion event. Install a
//! [`SearchMetrics`] implementation via [`set_search_metrics`] to record
//! per-search latency and outcomes.

pub mod availability;
mod bootstrap;
mod config;
mod engine;
mod error;
pub mod metrics;
pub mod risk;
mod types;

pub use crate::availability::{annotate, Pharmacy, Region, RegionTable};
pub use crate::bootstrap::IndexCell;
pub use crate::config::{MatcherConfig, PipelineConfig};
pub use crate::engine::MedicineMatcher;
pub use crate::error::{BootstrapError, MatchError};
pub use crate::metrics::{set_search_metrics, SearchKind, SearchMetrics, SearchOutcome};
pub use crate::risk::{RiskAssessment, RiskFilter, DEFAULT_SAFETY_THRESHOLD};
pub use crate::types::{MedicineQuery, NlpMatch, ScoredCandidate};
