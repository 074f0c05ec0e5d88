use crate::search::QueryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// A search form that cannot be compiled
    #[error("Validation error: {0}")]
    Query(#[from] QueryError),

    /// Prometheus exposition failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Query(_) => StatusCode::BAD_REQUEST,
            AppError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Query(_) => "VALIDATION_ERROR",
            AppError::Metrics(_) => "METRICS_ERROR",
        }
    }

    /// Finer-grained label for query failures
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            AppError::Query(e) => Some(e.kind()),
            AppError::Metrics(_) => None,
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error_code, status_code = status.as_u16(), message = %message, "Request error");
        } else {
            tracing::debug!(error_code, status_code = status.as_u16(), message = %message, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "kind": self.kind(),
                "message": message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
