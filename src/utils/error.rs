use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Transient conflict: {0}")]
    TransientConflict(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            AppError::CapacityExceeded(_) => StatusCode::BAD_REQUEST,
            AppError::TransientConflict(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            AppError::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            AppError::TransientConflict(_) => "TRANSIENT_CONFLICT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            // Expected outcomes of normal operation.
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::AlreadyRegistered(msg)
            | AppError::CapacityExceeded(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::TransientConflict(msg) => {
                warn!(code = self.code(), message = %msg, "Transaction conflict surfaced");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::AlreadyRegistered(msg)
            | AppError::CapacityExceeded(msg)
            | AppError::TransientConflict(msg) => msg.clone(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        let cases = [
            (
                AppError::ValidationError("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::AuthError("who".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                AppError::AlreadyRegistered("dup".into()),
                StatusCode::CONFLICT,
            ),
            (
                AppError::CapacityExceeded("full".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::TransientConflict("retry".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "wrong status for {}", err.code());
        }
    }

    #[test]
    fn test_database_error_is_internal() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "DATABASE_ERROR");
    }
}
