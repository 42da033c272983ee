use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::models::ConnectionStatus;

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot {action} a connection that is {status}")]
    InvalidTransition {
        action: &'static str,
        status: ConnectionStatus,
    },

    #[error("{0}")]
    InvalidState(String),

    #[error("a pending or active connection already exists between these users")]
    DuplicateConnection,

    #[error("you already submitted {0}")]
    DuplicateSubmission(String),

    #[error("{0}")]
    Validation(String),

    #[error("chat unlocks at {threshold}% progress (currently {progress}%)")]
    ChatLocked { progress: i32, threshold: i32 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Machine-readable code surfaced to clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } | Self::InvalidState(_) => "INVALID_TRANSITION",
            Self::DuplicateConnection => "DUPLICATE_CONNECTION",
            Self::DuplicateSubmission(_) => "DUPLICATE_SUBMISSION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ChatLocked { .. } => "CHAT_LOCKED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTransition { .. }
            | Self::InvalidState(_)
            | Self::DuplicateConnection
            | Self::DuplicateSubmission(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ChatLocked { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// True when the error is a Postgres unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Something went wrong, please try again".to_string()
            }
            Self::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Something went wrong, please try again".to_string()
            }
            other => {
                tracing::debug!("Rejected request: {}", other);
                other.to_string()
            }
        };

        (status, Json(ErrorBody { code: self.code(), message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let err = CoreError::InvalidTransition {
            action: "accept",
            status: ConnectionStatus::Ended,
        };
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "cannot accept a connection that is ENDED");

        let locked = CoreError::ChatLocked { progress: 40, threshold: 70 };
        assert_eq!(locked.code(), "CHAT_LOCKED");
        assert_eq!(locked.status_code(), StatusCode::FORBIDDEN);

        assert_eq!(CoreError::validation("too short").status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(CoreError::NotFound("connection").to_string(), "connection not found");
    }

    #[test]
    fn test_database_errors_hide_details() {
        let response = CoreError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_row_not_found_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
