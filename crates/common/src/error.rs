//! Error types for worklink.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Whether an account block is permanent or time-boxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    /// Permanent ban; never expires.
    Permanent,
    /// Temporary suspension; expires at the carried instant.
    Temporary,
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The access gate denied the request. Carries enough state for the
    /// client to render the full-screen block notice and countdown.
    #[error("Account blocked")]
    Blocked {
        kind: BlockKind,
        until: Option<DateTime<Utc>>,
        reason: Option<String>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Lost a compare-and-set race (e.g. a concurrent ticket claim).
    /// Recoverable: the caller must re-fetch current state, not retry blindly.
    #[error("Conflict: {0}")]
    Conflict(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::UserNotFound(_) | Self::TicketNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::Blocked { .. } => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::TicketNotFound(_) => "TICKET_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Blocked {
                kind: BlockKind::Permanent,
                ..
            } => "BANNED",
            Self::Blocked {
                kind: BlockKind::Temporary,
                ..
            } => "SUSPENDED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = match &self {
            Self::Blocked {
                kind,
                until,
                reason,
            } => Json(json!({
                "error": {
                    "code": code,
                    "message": self.to_string(),
                    "kind": kind,
                    "until": until,
                    "reason": reason,
                }
            })),
            _ => Json(json!({
                "error": {
                    "code": code,
                    "message": self.to_string(),
                }
            })),
        };

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_error_codes() {
        let banned = AppError::Blocked {
            kind: BlockKind::Permanent,
            until: None,
            reason: Some("fraud".to_string()),
        };
        assert_eq!(banned.error_code(), "BANNED");
        assert_eq!(banned.status_code(), StatusCode::FORBIDDEN);

        let suspended = AppError::Blocked {
            kind: BlockKind::Temporary,
            until: Some(Utc::now()),
            reason: None,
        };
        assert_eq!(suspended.error_code(), "SUSPENDED");
        assert_eq!(suspended.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_conflict_is_client_error() {
        let err = AppError::Conflict("claim lost".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(!err.is_server_error());
    }
}
