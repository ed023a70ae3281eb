use std::io;
use thiserror::Error;

/// Errors surfaced by encoders.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The ONNX model could not be located locally and no download URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (unknown mode, api mode without a URL, ...).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("transport failure: {0}")]
    Transport(String),
    /// The remote endpoint answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Tokenizer, ONNX Runtime or response-shape errors.
    #[error("inference failure: {0}")]
    Inference(String),
}

impl SemanticError {
    /// Whether retrying the same request could succeed.
    ///
    /// Transport failures and 408/429/5xx statuses are transient. Everything
    /// else (bad config, 4xx, malformed responses) fails the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            SemanticError::Transport(_) => true,
            SemanticError::Status { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            _ => false,
        }
    }
}

impl Clone for SemanticError {
    fn clone(&self) -> Self {
        match self {
            SemanticError::ModelNotFound(s) => SemanticError::ModelNotFound(s.clone()),
            SemanticError::TokenizerMissing(s) => SemanticError::TokenizerMissing(s.clone()),
            SemanticError::InvalidConfig(s) => SemanticError::InvalidConfig(s.clone()),
            SemanticError::Transport(s) => SemanticError::Transport(s.clone()),
            SemanticError::Status { status, body } => SemanticError::Status {
                status: *status,
                body: body.clone(),
            },
            SemanticError::Io(err) => SemanticError::Io(io::Error::new(err.kind(), err.to_string())),
            SemanticError::Inference(s) => SemanticError::Inference(s.clone()),
        }
    }
}
