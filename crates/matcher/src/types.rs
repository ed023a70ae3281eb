use canonical::normalize;
use catalog::CatalogEntry;
use serde::{Deserialize, Serialize};

/// Input of [`MedicineMatcher::search_medicines`](crate::MedicineMatcher::search_medicines).
///
/// `top_k` is signed so that zero and negative requests can be rejected as
/// invalid instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineQuery {
    pub symptom: String,
    pub allergy: String,
    #[serde(default)]
    pub region: Option<String>,
    pub top_k: i64,
    pub min_confidence: f32,
}

impl MedicineQuery {
    pub fn new(symptom: impl Into<String>, allergy: impl Into<String>) -> Self {
        Self {
            symptom: symptom.into(),
            allergy: allergy.into(),
            region: None,
            top_k: 10,
            min_confidence: 0.3,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Text embedded for retrieval.
    pub fn query_text(&self) -> String {
        format!(
            "Medicine for {} but not for someone with {} allergy",
            self.symptom, self.allergy
        )
    }
}

/// A medicine that passed retrieval and the allergy filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    #[serde(rename = "confidence_score")]
    pub confidence: f32,
    pub allergy_risk: f32,
    pub available_in_region: Option<bool>,
}

/// A free-text search hit. No allergy filtering is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlpMatch {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    #[serde(rename = "confidence_score")]
    pub confidence: f32,
}

/// Caller-facing copy of `entry`: text cleaned, rating defaulting to `N/A`,
/// link trimmed and defaulting to empty. Condition and side effects are also
/// lowercased when `lowercase_details` is set.
pub(crate) fn project_entry(entry: &CatalogEntry, lowercase_details: bool) -> CatalogEntry {
    let details = |text: &str| {
        let cleaned = normalize(text);
        if lowercase_details {
            cleaned.to_lowercase()
        } else {
            cleaned
        }
    };

    CatalogEntry {
        name: normalize(&entry.name),
        condition: details(&entry.condition),
        side_effects: details(&entry.side_effects),
        rating: Some(
            entry
                .rating
                .as_deref()
                .map_or_else(|| "N/A".to_owned(), normalize),
        ),
        link: Some(entry.link.as_deref().map(str::trim).unwrap_or_default().to_owned()),
    }
}
