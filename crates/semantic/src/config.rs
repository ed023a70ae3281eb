use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retry::RetryConfig;

/// Runtime configuration describing which encoder back end to build and how to
/// post-process its vectors.
///
/// # Example
/// ```
/// use semantic::SemanticConfig;
///
/// let cfg = SemanticConfig {
///     mode: "api".into(),
///     api_url: Some("https://api.openai.com/v1/embeddings".into()),
///     api_auth_header: Some("Bearer sk-xxx".into()),
///     api_provider: Some("openai".into()),
///     model_name: "text-embedding-3-small".into(),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Back end selector: `"onnx"` (local model), `"api"` (remote HTTP), or
    /// `"fast"` (deterministic feature hashing, no model needed).
    pub mode: String,
    /// Hashing dimensionality for `"fast"` mode: `"fast"` = 384,
    /// `"accurate"` = 1024, anything else = 768.
    pub tier: String,
    /// Model identity. Stored in the index cache; changing it invalidates
    /// previously persisted vectors.
    pub model_name: String,
    /// Local path of the ONNX model (download target when `model_url` is set).
    pub model_path: PathBuf,
    /// Optional URL fetched when `model_path` does not exist.
    pub model_url: Option<String>,
    /// Path to `tokenizer.json`. Defaults to a file next to the model.
    pub tokenizer_path: Option<PathBuf>,
    /// Optional URL fetched when the tokenizer file does not exist.
    pub tokenizer_url: Option<String>,
    /// Tokens beyond this length are truncated before inference.
    pub max_sequence_length: usize,
    /// API inference endpoint when `mode` is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header value (e.g. `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Payload shape: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Per-request timeout for API calls, in seconds.
    pub api_timeout_secs: u64,
    /// L2-normalize every vector.
    pub normalize: bool,
    /// Retry policy for transient API failures.
    pub retry: RetryConfig,
    /// Number of recent single-text encodings kept in memory. `0` disables
    /// the cache.
    pub cache_capacity: usize,
    /// In `"onnx"` mode, use the hashing encoder instead of failing when the
    /// model or tokenizer cannot be found, or when the crate was built
    /// without the `onnx` feature. Ranking is then lexical, not semantic.
    pub fallback_to_hashing: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "onnx".into(),
            tier: "fast".into(),
            model_name: "all-MiniLM-L6-v2".into(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2/model.onnx"),
            model_url: None,
            tokenizer_path: None,
            tokenizer_url: None,
            max_sequence_length: 256,
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: 30,
            normalize: true,
            retry: RetryConfig::default(),
            cache_capacity: 1024,
            fallback_to_hashing: true,
        }
    }
}

impl SemanticConfig {
    /// Checks mode-specific requirements without touching the filesystem or
    /// network.
    pub fn validate(&self) -> Result<(), crate::SemanticError> {
        use crate::SemanticError::InvalidConfig;

        match self.mode.as_str() {
            "fast" => Ok(()),
            "api" => match self.api_url.as_deref() {
                Some(url) if !url.trim().is_empty() => {
                    if self.api_timeout_secs == 0 {
                        return Err(InvalidConfig("api_timeout_secs must be positive".into()));
                    }
                    Ok(())
                }
                _ => Err(InvalidConfig("api_url is required for api mode".into())),
            },
            "onnx" => {
                if self.max_sequence_length == 0 {
                    return Err(InvalidConfig("max_sequence_length must be positive".into()));
                }
                if cfg!(feature = "onnx") || self.fallback_to_hashing {
                    Ok(())
                } else {
                    Err(InvalidConfig(
                        "onnx mode requires the `onnx` feature or fallback_to_hashing".into(),
                    ))
                }
            }
            other => Err(InvalidConfig(format!("unknown encoder mode '{other}'"))),
        }
    }

    /// Tokenizer location, defaulting to `tokenizer.json` next to the model.
    pub fn resolved_tokenizer_path(&self) -> PathBuf {
        match &self.tokenizer_path {
            Some(path) => path.clone(),
            None => self
                .model_path
                .parent()
                .map(|dir| dir.join("tokenizer.json"))
                .unwrap_or_else(|| PathBuf::from("tokenizer.json")),
        }
    }

    /// Vector width produced by the hashing encoder for this tier.
    pub fn hashing_dim(&self) -> usize {
        match self.tier.as_str() {
            "fast" => 384,
            "accurate" => 1024,
            _ => 768,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SemanticError;

    #[test]
    fn config_default_values() {
        let cfg = SemanticConfig::default();
        assert_eq!(cfg.mode, "onnx");
        assert!(cfg.fallback_to_hashing);
        assert_eq!(cfg.model_name, "all-MiniLM-L6-v2");
        assert_eq!(cfg.max_sequence_length, 256);
        assert_eq!(cfg.api_timeout_secs, 30);
        assert!(cfg.normalize);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn api_mode_requires_url() {
        let cfg = SemanticConfig {
            mode: "api".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SemanticError::InvalidConfig(_))));

        let cfg = SemanticConfig {
            mode: "api".into(),
            api_url: Some("http://localhost:8080/embed".into()),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let cfg = SemanticConfig {
            mode: "quantum".into(),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("quantum"));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn onnx_mode_needs_feature_or_fallback() {
        let strict = SemanticConfig {
            mode: "onnx".into(),
            fallback_to_hashing: false,
            ..Default::default()
        };
        assert!(strict.validate().is_err());
        assert!(SemanticConfig::default().validate().is_ok());
    }

    #[test]
    fn tokenizer_defaults_next_to_model() {
        let cfg = SemanticConfig {
            model_path: PathBuf::from("/models/minilm/model.onnx"),
            ..Default::default()
        };
        assert_eq!(
            cfg.resolved_tokenizer_path(),
            PathBuf::from("/models/minilm/tokenizer.json")
        );
    }

    #[test]
    fn hashing_dim_by_tier() {
        let dims: Vec<usize> = ["fast", "balanced", "accurate"]
            .iter()
            .map(|tier| {
                SemanticConfig {
                    tier: (*tier).into(),
                    ..Default::default()
                }
                .hashing_dim()
            })
            .collect();
        assert_eq!(dims, vec![384, 768, 1024]);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: SemanticConfig =
            serde_json::from_str(r#"{"mode": "api", "api_url": "http://x/embed"}"#).unwrap();
        assert_eq!(cfg.mode, "api");
        assert_eq!(cfg.model_name, "all-MiniLM-L6-v2");
        assert_eq!(cfg.retry, RetryConfig::default());
    }
}
