//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use portal_core::PortalError;
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Validation(String),
    DuplicateEmail,
    EmailNotRegistered,
    InvalidPassword,
    InvalidOrExpiredToken,
    Forbidden(String),
    EmailSend(String),
    Database(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ApiError::new("NOT_FOUND", format!("{msg} not found")),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("VALIDATION_ERROR", msg))
            }
            AppError::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                ApiError::new("DUPLICATE_EMAIL", "This email is already registered"),
            ),
            AppError::EmailNotRegistered => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("EMAIL_NOT_REGISTERED", "Email not registered"),
            ),
            AppError::InvalidPassword => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("INVALID_PASSWORD", "Invalid password"),
            ),
            AppError::InvalidOrExpiredToken => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_OR_EXPIRED_TOKEN", "Invalid or expired token"),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", msg)),
            AppError::EmailSend(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("EMAIL_SEND_FAILED", "Failed to send email").with_details(msg),
            ),
            AppError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("DATABASE_ERROR", "Database operation failed").with_details(msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", "Internal server error").with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<PortalError> for AppError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::Validation(msg) => AppError::Validation(msg),
            PortalError::DuplicateEmail => AppError::DuplicateEmail,
            PortalError::EmailNotRegistered => AppError::EmailNotRegistered,
            PortalError::InvalidPassword => AppError::InvalidPassword,
            PortalError::InvalidOrExpiredToken => AppError::InvalidOrExpiredToken,
            PortalError::NotFound(msg) => AppError::NotFound(msg),
            PortalError::AccessDenied { reason } => AppError::Forbidden(reason),
            PortalError::EmailSend(msg) => AppError::EmailSend(msg),
            PortalError::DatabaseError(msg) => AppError::Database(msg),
            PortalError::ConfigError(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            PortalError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}
