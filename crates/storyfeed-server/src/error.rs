use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use storyfeed_core::FeedError;
use thiserror::Error;

/// Failures starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("feed setup failed: {0}")]
    Feed(#[from] FeedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A failed request, rendered as `{"error": {"code", "message"}}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn invalid_payload(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_payload",
            message,
        }
    }
}

/// HTTP status for each feed error kind.
pub fn status_for(err: &FeedError) -> StatusCode {
    match err {
        FeedError::InvalidIdentifier { .. } | FeedError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        FeedError::NotFound { .. } | FeedError::NoMatches(_) => StatusCode::NOT_FOUND,
        FeedError::DuplicateKey(_) => StatusCode::CONFLICT,
        FeedError::IntegrityFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
        FeedError::Store(_) | FeedError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        Self {
            status: status_for(&err),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_payload(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_payload(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        } else {
            tracing::debug!(code = self.code, message = %self.message, "request rejected");
        }
        let body = ErrorBody {
            error: ErrorPayload {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
