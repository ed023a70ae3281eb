//! Text encoders for the medicine search pipeline.
//!
//! This crate turns text into vectors. The same [`QueryEncoder`] encodes the
//! catalog when the index is built and every query afterwards, so all vectors
//! share one space.
//!
//! Back ends, selected by [`SemanticConfig::mode`]:
//!
//! - **`onnx`**: run a sentence-transformer (all-MiniLM-L6-v2 by default)
//!   locally. The default. Needs the `onnx` cargo feature plus model and
//!   tokenizer files, which are downloaded when URLs are configured. With
//!   `fallback_to_hashing` (on by default) a missing model or feature degrades
//!   to `fast` with a warning.
//! - **`api`**: call a remote embedding endpoint (Hugging Face, OpenAI, or a
//!   custom JSON shape) with retry and backoff for transient failures.
//! - **`fast`**: deterministic feature hashing. No model, no network. Good
//!   for tests and offline runs, not for real ranking quality.
//!
//! ## Quick example
//!
//! ```
//! use semantic::{build_query_encoder, cosine_similarity, SemanticConfig};
//!
//! # tokio_test::block_on(async {
//! let cfg = SemanticConfig {
//!     mode: "fast".into(),
//!     ..SemanticConfig::default()
//! };
//! let encoder = build_query_encoder(&cfg).await.unwrap();
//! let a = encoder.encode("stomach upset").await.unwrap();
//! let b = encoder.encode("Stomach upset!").await.unwrap();
//! assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
//! # });
//! ```

mod api;
mod config;
mod encoder;
mod error;
mod hashing;
mod normalize;
#[cfg(feature = "onnx")]
mod onnx;
mod query;
pub mod retry;
mod serde_millis;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::sync::Arc;
use tracing::{info, warn};

pub use crate::api::ApiEncoder;
pub use crate::config::SemanticConfig;
pub use crate::encoder::Encoder;
pub use crate::error::SemanticError;
pub use crate::hashing::HashingEncoder;
pub use crate::normalize::{cosine_similarity, l2_normalize_in_place};
#[cfg(feature = "onnx")]
pub use crate::onnx::OnnxEncoder;
pub use crate::query::QueryEncoder;
pub use crate::retry::RetryConfig;

/// Builds the encoder back end described by `cfg`.
///
/// With `fallback_to_hashing` set, an `onnx` configuration whose model or
/// tokenizer cannot be found, or a build without the `onnx` feature, degrades
/// to the hashing encoder instead of failing. The fallback has its own model
/// name, so a persisted index built by one never passes for the other.
pub async fn build_encoder(cfg: &SemanticConfig) -> Result<Arc<dyn Encoder>, SemanticError> {
    cfg.validate()?;

    let encoder: Arc<dyn Encoder> = match cfg.mode.as_str() {
        "fast" => Arc::new(HashingEncoder::from_config(cfg)),
        "api" => Arc::new(ApiEncoder::from_config(cfg)?),
        "onnx" => build_onnx(cfg).await?,
        other => {
            return Err(SemanticError::InvalidConfig(format!(
                "unknown encoder mode '{other}'"
            )))
        }
    };

    info!(mode = %cfg.mode, model = %encoder.model_name(), "encoder_ready");
    Ok(encoder)
}

/// [`build_encoder`] wrapped in a [`QueryEncoder`] with the configured cache.
pub async fn build_query_encoder(cfg: &SemanticConfig) -> Result<QueryEncoder, SemanticError> {
    let encoder = build_encoder(cfg).await?;
    Ok(QueryEncoder::new(encoder, cfg.cache_capacity))
}

#[cfg(feature = "onnx")]
async fn build_onnx(cfg: &SemanticConfig) -> Result<Arc<dyn Encoder>, SemanticError> {
    match OnnxEncoder::load(cfg).await {
        Ok(encoder) => Ok(Arc::new(encoder)),
        Err(err) if cfg.fallback_to_hashing && is_missing_asset(&err) => {
            Ok(hashing_fallback(cfg, &err.to_string()))
        }
        Err(err) => Err(err),
    }
}

#[cfg(not(feature = "onnx"))]
async fn build_onnx(cfg: &SemanticConfig) -> Result<Arc<dyn Encoder>, SemanticError> {
    if cfg.fallback_to_hashing {
        Ok(hashing_fallback(cfg, "built without the onnx feature"))
    } else {
        Err(SemanticError::InvalidConfig(
            "onnx mode requires building with the `onnx` feature".into(),
        ))
    }
}

fn hashing_fallback(cfg: &SemanticConfig, reason: &str) -> Arc<dyn Encoder> {
    let encoder = HashingEncoder::from_config(cfg);
    warn!(
        reason,
        model = %encoder.model_name(),
        ranking = "lexical",
        "onnx_unavailable_using_lexical_hashing_encoder"
    );
    Arc::new(encoder)
}

#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
fn is_missing_asset(err: &SemanticError) -> bool {
    matches!(
        err,
        SemanticError::ModelNotFound(_)
            | SemanticError::TokenizerMissing(_)
            | SemanticError::Transport(_)
            | SemanticError::Status { .. }
    )
}
