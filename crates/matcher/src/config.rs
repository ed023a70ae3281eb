use std::path::PathBuf;

use index::IndexConfig;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};

use crate::MatchError;

/// Tuning knobs for [`MedicineMatcher`](crate::MedicineMatcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Retrieval asks for `top_k * oversample_factor` candidates so the
    /// allergy filter has room to drop some and still fill the page.
    pub oversample_factor: usize,
    /// Candidates whose allergy/side-effect similarity is above this are
    /// excluded.
    pub safety_threshold: f32,
    /// Threshold used when a caller gives none, and always for free-text search.
    pub default_min_confidence: f32,
    pub default_top_k: i64,
    pub default_nlp_top_k: i64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            oversample_factor: 2,
            safety_threshold: 0.4,
            default_min_confidence: 0.3,
            default_top_k: 10,
            default_nlp_top_k: 3,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.oversample_factor == 0 {
            return Err(MatchError::InvalidConfig(
                "oversample_factor must be at least 1".into(),
            ));
        }
        if !is_similarity(self.safety_threshold) {
            return Err(MatchError::InvalidConfig(
                "safety_threshold must be within [-1, 1]".into(),
            ));
        }
        if !is_similarity(self.default_min_confidence) {
            return Err(MatchError::InvalidConfig(
                "default_min_confidence must be within [-1, 1]".into(),
            ));
        }
        if self.default_top_k <= 0 || self.default_nlp_top_k <= 0 {
            return Err(MatchError::InvalidConfig(
                "default top_k values must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn with_oversample_factor(mut self, factor: usize) -> Self {
        self.oversample_factor = factor;
        self
    }

    pub fn with_safety_threshold(mut self, threshold: f32) -> Self {
        self.safety_threshold = threshold;
        self
    }
}

pub(crate) fn is_similarity(value: f32) -> bool {
    value.is_finite() && (-1.0..=1.0).contains(&value)
}

/// Everything needed to bring a matcher up from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub catalog_path: PathBuf,
    /// Where the built index is cached. `None` rebuilds on every start.
    pub cache_path: Option<PathBuf>,
    /// Optional JSON region table replacing the built-in one.
    pub region_file: Option<PathBuf>,
    pub semantic: SemanticConfig,
    pub index: IndexConfig,
    pub matcher: MatcherConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("drugs_data.json"),
            cache_path: Some(PathBuf::from("medicine_embeddings.bin")),
            region_file: None,
            semantic: SemanticConfig::default(),
            index: IndexConfig::default(),
            matcher: MatcherConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = MatcherConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.oversample_factor, 2);
        assert_eq!(cfg.safety_threshold, 0.4);
        assert_eq!(cfg.default_min_confidence, 0.3);
    }

    #[test]
    fn zero_oversample_rejected() {
        let err = MatcherConfig::default()
            .with_oversample_factor(0)
            .validate()
            .unwrap_err();
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("oversample_factor")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        for threshold in [1.5, -2.0, f32::NAN] {
            let cfg = MatcherConfig::default().with_safety_threshold(threshold);
            assert!(cfg.validate().is_err(), "{threshold} should be rejected");
        }
    }

    #[test]
    fn pipeline_config_fills_missing_sections() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"catalog_path": "catalog.json", "matcher": {"safety_threshold": 0.5}}"#)
                .unwrap();
        assert_eq!(cfg.catalog_path, PathBuf::from("catalog.json"));
        assert_eq!(cfg.matcher.safety_threshold, 0.5);
        assert_eq!(cfg.matcher.oversample_factor, 2);
        assert_eq!(cfg.semantic, SemanticConfig::default());
    }

    #[test]
    fn default_pipeline_prefers_onnx_with_lexical_fallback() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.semantic.mode, "onnx");
        assert!(cfg.semantic.fallback_to_hashing);
    }
}
