//! Allergy-versus-side-effect proximity check.
//!
//! This is a heuristic safety net, not a medical guarantee. It compares two
//! free-text strings with a general-purpose sentence encoder, so it can miss
//! a real conflict that is phrased differently (false negative) and can drop
//! a safe medicine whose side effects merely read like the allergy (false
//! positive).

use canonical::normalize;
use semantic::{cosine_similarity, QueryEncoder, SemanticError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAFETY_THRESHOLD: f32 = 0.4;

/// Risk score for one candidate. `safe` is `allergy_risk <= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub allergy_risk: f32,
    pub safe: bool,
}

impl RiskAssessment {
    const NO_ALLERGY: Self = Self {
        allergy_risk: 0.0,
        safe: true,
    };
}

/// An allergy statement encoded once and reused for every candidate of a
/// request. A blank statement carries no vector and never flags anything.
#[derive(Debug, Clone)]
pub struct AllergyProfile {
    vector: Option<Vec<f32>>,
}

impl AllergyProfile {
    pub fn none() -> Self {
        Self { vector: None }
    }

    pub fn is_stated(&self) -> bool {
        self.vector.is_some()
    }
}

/// Excludes candidates whose side effects read too much like the allergy.
///
/// See the module docs for the limits of this check.
#[derive(Debug, Clone)]
pub struct RiskFilter {
    encoder: QueryEncoder,
    threshold: f32,
}

impl RiskFilter {
    pub fn new(encoder: QueryEncoder, threshold: f32) -> Self {
        Self { encoder, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Encodes `allergy` as given. Blank input yields an empty profile.
    pub async fn profile(&self, allergy: &str) -> Result<AllergyProfile, SemanticError> {
        if allergy.trim().is_empty() {
            return Ok(AllergyProfile::none());
        }
        let vector = self.encoder.encode(allergy).await?;
        Ok(AllergyProfile {
            vector: Some(vector),
        })
    }

    /// Scores `side_effects` against an already encoded allergy.
    ///
    /// Side effects are cleaned and lowercased before encoding, matching the
    /// text returned to callers.
    pub async fn assess_profile(
        &self,
        profile: &AllergyProfile,
        side_effects: &str,
    ) -> Result<RiskAssessment, SemanticError> {
        let Some(allergy) = profile.vector.as_deref() else {
            return Ok(RiskAssessment::NO_ALLERGY);
        };
        let side_effects = normalize(side_effects).to_lowercase();
        let side_vector = self.encoder.encode(&side_effects).await?;
        let allergy_risk = cosine_similarity(allergy, &side_vector);
        Ok(RiskAssessment {
            allergy_risk,
            safe: allergy_risk <= self.threshold,
        })
    }

    pub async fn assess(
        &self,
        allergy: &str,
        side_effects: &str,
    ) -> Result<RiskAssessment, SemanticError> {
        let profile = self.profile(allergy).await?;
        self.assess_profile(&profile, side_effects).await
    }

    pub async fn is_safe(&self, allergy: &str, side_effects: &str) -> Result<bool, SemanticError> {
        Ok(self.assess(allergy, side_effects).await?.safe)
    }
}
