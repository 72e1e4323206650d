//! Centralized error types for Atelier.
//!
//! Uses `thiserror` for ergonomic error definitions and provides HTTP-friendly
//! error variants that can be directly converted to API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Which step of a multi-write operation failed.
///
/// Match creation and join-request acceptance both perform several dependent
/// writes; when the sequential path fails partway, callers need to know how
/// far it got to reconcile client state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    Match,
    Conversation,
    Participant,
    Membership,
}

impl WriteStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Conversation => "conversation",
            Self::Participant => "participant",
            Self::Membership => "membership",
        }
    }
}

/// Core application error type used across all Atelier services.
#[derive(Debug, thiserror::Error)]
pub enum AtelierError {
    // === Auth errors ===
    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    // === Lifecycle errors ===
    #[error("Not on a team")]
    NoTeam,

    #[error("Invalid match state: {reason}")]
    InvalidState { reason: String },

    #[error("Write failed at step '{}': {source}", .step.as_str())]
    PartialWrite {
        step: WriteStep,
        #[source]
        source: sqlx::Error,
    },

    // === Resource errors ===
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    // === Validation errors ===
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // === Infrastructure errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body sent to clients.
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
    message: String,
}

impl AtelierError {
    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NoTeam => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidState { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyExists { .. } => StatusCode::CONFLICT,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::PartialWrite { .. } | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Error code string for programmatic handling by clients.
    pub fn error_code(&self) -> &str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NoTeam => "NO_TEAM",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::PartialWrite { .. } => "PARTIAL_WRITE",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AtelierError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't leak internal details to clients
        let message = match &self {
            AtelierError::Database(e) => {
                tracing::error!("Database error: {e}");
                "An internal error occurred".to_string()
            }
            AtelierError::PartialWrite { step, source } => {
                tracing::error!(step = step.as_str(), "Partial write: {source}");
                "An internal error occurred".to_string()
            }
            AtelierError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            error: self.error_code().to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results using AtelierError.
pub type AtelierResult<T> = Result<T, AtelierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_write_names_the_failed_step() {
        let err = AtelierError::PartialWrite {
            step: WriteStep::Conversation,
            source: sqlx::Error::PoolClosed,
        };
        assert!(err.to_string().contains("conversation"));
        assert_eq!(err.error_code(), "PARTIAL_WRITE");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn lifecycle_errors_map_to_client_statuses() {
        assert_eq!(AtelierError::NoTeam.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let invalid = AtelierError::InvalidState { reason: "already accepted".into() };
        assert_eq!(invalid.status_code(), StatusCode::CONFLICT);
    }
}
