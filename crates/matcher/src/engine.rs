use std::sync::Arc;
use std::time::Instant;

use index::{retrieve, EmbeddingIndex, RetrievalResult};
use semantic::QueryEncoder;
use tracing::{info, Instrument, Level};

use crate::availability::{annotate, RegionTable};
use crate::config::{is_similarity, MatcherConfig};
use crate::metrics::{metrics_recorder, SearchKind, SearchOutcome};
use crate::risk::RiskFilter;
use crate::types::{project_entry, MedicineQuery, NlpMatch, ScoredCandidate};
use crate::MatchError;


/// The search service: one shared index, the encoder that built it, the
/// allergy filter and the region table.
///
/// Everything inside is immutable after construction, so a single instance
/// behind an `Arc` serves concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct MedicineMatcher {
    index: Arc<EmbeddingIndex>,
    encoder: QueryEncoder,
    risk: RiskFilter,
    regions: Arc<RegionTable>,
    cfg: MatcherConfig,
}

impl MedicineMatcher {
    /// Fails when `cfg` is invalid or when `index` was built by a different
    /// encoder model than `encoder`.
    pub fn new(
        index: Arc<EmbeddingIndex>,
        encoder: QueryEncoder,
        regions: Arc<RegionTable>,
        cfg: MatcherConfig,
    ) -> Result<Self, MatchError> {
        cfg.validate()?;
        if index.model_name() != encoder.model_name() {
            return Err(MatchError::InvalidConfig(format!(
                "index built with '{}' but queries use '{}'",
                index.model_name(),
                encoder.model_name()
            )));
        }

        let risk = RiskFilter::new(encoder.clone(), cfg.safety_threshold);
        Ok(Self {
            index,
            encoder,
            risk,
            regions,
            cfg,
        })
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn encoder(&self) -> &QueryEncoder {
        &self.encoder
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.cfg
    }

    /// Allergy-aware medicine search.
    ///
    /// Retrieves `top_k * oversample_factor` candidates at or above
    /// `min_confidence`, then walks them in rank order: incomplete entries
    /// are skipped, entries whose side effects are too close to the allergy
    /// are excluded, and the rest are annotated and projected until `top_k`
    /// are accepted.
    pub async fn search_medicines(
        &self,
        query: &MedicineQuery,
    ) -> Result<Vec<ScoredCandidate>, MatchError> {
        let span = tracing::span!(
            Level::INFO,
            "matcher.search_medicines",
            top_k = query.top_k,
            region = query.region.as_deref().unwrap_or("")
        );
        let start = Instant::now();
        let result = self.run_medicine_search(query).instrument(span).await;

        let outcome = match &result {
            Ok((candidates, excluded)) => SearchOutcome::Completed {
                returned: candidates.len(),
                excluded: *excluded,
            },
            Err(err) => failure_outcome(err),
        };
        report(SearchKind::Medicines, start, outcome);

        result.map(|(candidates, _)| candidates)
    }

    async fn run_medicine_search(
        &self,
        query: &MedicineQuery,
    ) -> Result<(Vec<ScoredCandidate>, usize), MatchError> {
        let start = Instant::now();
        let top_k = validate_top_k(query.top_k)?;
        if query.symptom.trim().is_empty() {
            return Err(MatchError::InvalidRequest("symptom must not be empty".into()));
        }
        if !is_similarity(query.min_confidence) {
            return Err(MatchError::InvalidRequest(
                "min_confidence must be a number within [-1, 1]".into(),
            ));
        }

        let query_vector = self.encoder.encode(&query.query_text()).await?;
        let hits = retrieve(
            &query_vector,
            &self.index,
            top_k.saturating_mul(self.cfg.oversample_factor),
            query.min_confidence,
        )?;

        let mut accepted = Vec::with_capacity(top_k.min(hits.len()));
        let mut excluded = 0usize;
        if !hits.is_empty() {
            let profile = self.risk.profile(&query.allergy).await?;

            for RetrievalResult {
                entry_index,
                similarity,
            } in &hits
            {
                let Some(entry) = self.index.entry(*entry_index) else {
                    continue;
                };
                if !entry.has_required_fields() {
                    continue;
                }

                let risk = self.risk.assess_profile(&profile, &entry.side_effects).await?;
                if !risk.safe {
                    excluded += 1;
                    continue;
                }

                accepted.push(ScoredCandidate {
                    entry: project_entry(entry, true),
                    confidence: *similarity,
                    allergy_risk: risk.allergy_risk,
                    available_in_region: annotate(
                        &entry.name,
                        query.region.as_deref(),
                        &self.regions,
                    ),
                });
                if accepted.len() >= top_k {
                    break;
                }
            }
        }

        info!(
            candidates = hits.len(),
            returned = accepted.len(),
            excluded,
            elapsed_micros = start.elapsed().as_micros(),
            "medicine_search_complete"
        );
        Ok((accepted, excluded))
    }

    /// Free-text search with the default confidence threshold and no
    /// allergy filtering.
    pub async fn nlp_search(&self, prompt: &str, top_k: i64) -> Result<Vec<NlpMatch>, MatchError> {
        let span = tracing::span!(Level::INFO, "matcher.nlp_search", top_k);
        let start = Instant::now();
        let result = self.run_nlp_search(prompt, top_k).instrument(span).await;

        let outcome = match &result {
            Ok(matches) => SearchOutcome::Completed {
                returned: matches.len(),
                excluded: 0,
            },
            Err(err) => failure_outcome(err),
        };
        report(SearchKind::Nlp, start, outcome);

        result
    }

    async fn run_nlp_search(&self, prompt: &str, top_k: i64) -> Result<Vec<NlpMatch>, MatchError> {
        let start = Instant::now();
        let top_k = validate_top_k(top_k)?;
        if prompt.trim().is_empty() {
            return Err(MatchError::InvalidRequest("prompt must not be empty".into()));
        }

        let query_vector = self.encoder.encode(prompt).await?;
        let hits = retrieve(
            &query_vector,
            &self.index,
            top_k,
            self.cfg.default_min_confidence,
        )?;

        let matches: Vec<NlpMatch> = hits
            .iter()
            .filter_map(|hit| {
                self.index.entry(hit.entry_index).map(|entry| NlpMatch {
                    entry: project_entry(entry, false),
                    confidence: hit.similarity,
                })
            })
            .collect();

        info!(
            returned = matches.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "nlp_search_complete"
        );
        Ok(matches)
    }
}

fn validate_top_k(top_k: i64) -> Result<usize, MatchError> {
    if top_k <= 0 {
        return Err(MatchError::InvalidRequest(format!(
            "top_k must be greater than zero, got {top_k}"
        )));
    }
    usize::try_from(top_k)
        .map_err(|_| MatchError::InvalidRequest(format!("top_k {top_k} is too large")))
}

fn failure_outcome(err: &MatchError) -> SearchOutcome {
    if err.is_client_error() {
        SearchOutcome::Rejected
    } else {
        SearchOutcome::Failed
    }
}

fn report(kind: SearchKind, start: Instant, outcome: SearchOutcome) {
    if let Some(recorder) = metrics_recorder() {
        recorder.record_search(kind, start.elapsed(), outcome);
    }
}
