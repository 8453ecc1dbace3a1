use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use shared::responses::ApiResponse;
use thiserror::Error;

// Scheduling Service Error
#[derive(Debug, Error)]
pub enum SchedulingServiceError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Resource service error: {0}")]
    ResourceService(String),

    #[error("Resource service unavailable: {0}")]
    ResourceServiceUnavailable(String),

    #[error("Circuit breaker is open - resource service unavailable")]
    CircuitOpen,

    #[error("Schedule generation failed: {0}")]
    Engine(#[from] scheduling_engine::EngineError),
}

impl IntoResponse for SchedulingServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
            Self::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Oof, Something went wrong while accessing the database.".into(),
            ),
            Self::ResourceService(message) => (StatusCode::BAD_GATEWAY, message.clone()),
            Self::ResourceServiceUnavailable(message) => {
                (StatusCode::BAD_GATEWAY, message.clone())
            }
            Self::CircuitOpen => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Resource service is currently unavailable, please try again later".into(),
            ),
            Self::Engine(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Server error");
        } else {
            tracing::warn!(error = %self, %status, "Client error");
        }

        let body = ApiResponse::<()>::err(message);
        (status, axum::Json(body)).into_response()
    }
}
