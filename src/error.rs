use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
///
/// `Import`, `RecommendationUnavailable` and `Persistence` are the three failure kinds a user can
/// retry at their discretion. The rest describe requests that cannot be served as issued.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Import failed: {0}")]
    Import(String),

    #[error("Recommendation unavailable: {0}")]
    RecommendationUnavailable(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("A recommendation request is already in progress")]
    RecommendationInProgress,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable name for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Import(_) => "import_failure",
            AppError::RecommendationUnavailable(_) => "recommendation_unavailable",
            AppError::Persistence(_) => "persistence_failure",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::RecommendationInProgress => "recommendation_in_progress",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Import(_) => StatusCode::BAD_GATEWAY,
            AppError::RecommendationUnavailable(_) | AppError::Persistence(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::AlreadyExists(_) | AppError::RecommendationInProgress => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Persistence(format!("redis: {}", e))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Persistence(format!("postgres: {}", e))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Persistence(format!("migration: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "Request rejected");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
