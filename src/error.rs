use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    MethodNotAllowed(String),
    RateLimited(String),
    Internal(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::MethodNotAllowed(msg) => write!(f, "Method Not Allowed: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the underlying database error is a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation())
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::MethodNotAllowed(msg)
            | AppError::RateLimited(msg) => msg.clone(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::Database(err @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed)) => {
                tracing::error!("Database unavailable: {err}");
                "Database not available".to_string()
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                "Internal server error".to_string()
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}
