use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("No diary entries in the selected period")]
    InsufficientData,

    #[error("Scoring incomplete: {0}")]
    IncompleteScoring(String),

    #[error("Scoring request timed out")]
    ScoringTimeout,

    #[error("Scoring service unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("Report persistence failed: {0}")]
    PersistenceFailure(sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable label, used in logs and batch outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::RateLimited => "rate_limited",
            AppError::InvalidPeriod(_) => "invalid_period",
            AppError::InsufficientData => "insufficient_data",
            AppError::IncompleteScoring(_) => "incomplete_scoring",
            AppError::ScoringTimeout => "scoring_timeout",
            AppError::ScoringUnavailable(_) => "scoring_unavailable",
            AppError::PersistenceFailure(_) => "persistence_failure",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::InvalidPeriod(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InsufficientData => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::IncompleteScoring(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::ScoringTimeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::ScoringUnavailable(e) => {
                tracing::error!(error = %e, "Scoring service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Scoring service temporarily unavailable".into(),
                )
            }
            AppError::PersistenceFailure(e) => {
                tracing::error!(error = %e, "Failed to persist report");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store report".into(),
                )
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        let retry_after = matches!(&self, AppError::ScoringUnavailable(_));

        let body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
            }
        });

        let mut response = (status, Json(body)).into_response();
        if retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("60"));
        }
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;
