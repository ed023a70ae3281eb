use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use matcher::MatchError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Search failed: {0}")]
    Match(#[from] MatchError),

    #[error("Metrics are disabled")]
    MetricsDisabled,

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Match(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::NotFound | ServerError::MetricsDisabled => StatusCode::NOT_FOUND,
            ServerError::Match(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "INVALID_REQUEST",
            ServerError::Match(MatchError::InvalidRequest(_)) => "INVALID_REQUEST",
            ServerError::Match(MatchError::Encoder(_)) => "ENCODER_ERROR",
            ServerError::Match(MatchError::Index(_)) => "INDEX_ERROR",
            ServerError::Match(MatchError::InvalidConfig(_)) => "CONFIG_ERROR",
            ServerError::MetricsDisabled | ServerError::NotFound => "NOT_FOUND",
        }
    }

    /// Message shown to callers. Client errors keep the validator's wording.
    fn message(&self) -> String {
        match self {
            ServerError::Match(MatchError::InvalidRequest(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request_failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}
