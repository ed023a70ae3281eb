use catalog::CatalogError;
use index::IndexError;
use semantic::SemanticError;
use thiserror::Error;

/// Errors produced while serving a search.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Caller input rejected before any retrieval happens.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid matcher config: {0}")]
    InvalidConfig(String),
    /// Encoding the query, allergy, or side-effect text failed.
    #[error("encoder error: {0}")]
    Encoder(#[from] SemanticError),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl MatchError {
    /// `true` for errors caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, MatchError::InvalidRequest(_))
    }
}

/// Errors that stop a matcher from coming up. All of them are fatal.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid pipeline config: {0}")]
    Config(String),
    #[error("failed to build encoder: {0}")]
    Encoder(#[from] SemanticError),
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to build index: {0}")]
    Index(#[from] IndexError),
    #[error("failed to load region table from {path}: {message}")]
    Regions { path: String, message: String },
}

impl From<MatchError> for BootstrapError {
    fn from(err: MatchError) -> Self {
        BootstrapError::Config(err.to_string())
    }
}
