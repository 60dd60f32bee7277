// Authentication-specific error handling utilities
// Every endpoint failure is rendered through AuthError so clients see one envelope

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    db::StoreError, services::email::EmailError, utils::password::PasswordError,
    utils::validation::FieldErrors,
};

/// Authentication-specific errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("The given data was invalid: {0}")]
    Validation(FieldErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Email address is already verified")]
    AlreadyVerified,

    #[error("Invalid or expired verification link")]
    InvalidLink,

    #[error("Too many requests")]
    RateLimited { retry_after_seconds: u64 },

    #[error("User not found")]
    UserNotFound,

    #[error("Storage error: {0}")]
    StoreError(String),

    #[error("Password hashing failed: {0}")]
    HashError(String),

    #[error("Notification delivery failed: {0}")]
    NotificationError(String),
}

/// Standard authentication response structure
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl AuthError {
    /// Shorthand for a validation failure on a single field
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AuthError::Validation(FieldErrors::single(field, message))
    }

    /// Convert to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::AlreadyVerified => StatusCode::BAD_REQUEST,
            AuthError::InvalidLink => StatusCode::FORBIDDEN,
            AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::HashError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::NotificationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::AlreadyVerified => "ALREADY_VERIFIED",
            AuthError::InvalidLink => "INVALID_SIGNATURE",
            AuthError::RateLimited { .. } => "RATE_LIMITED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::StoreError(_) => "STORE_ERROR",
            AuthError::HashError(_) => "HASH_ERROR",
            AuthError::NotificationError(_) => "NOTIFICATION_ERROR",
        }
    }

    /// Get retry_after value if applicable
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            AuthError::RateLimited {
                retry_after_seconds,
            } => Some(*retry_after_seconds),
            _ => None,
        }
    }

    /// Message safe to show to clients. Server-side causes stay in the logs.
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }

    /// Field-level messages attached to the response body
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            AuthError::Validation(errors) => Some(errors.clone()),
            AuthError::AlreadyVerified => Some(FieldErrors::single(
                "email",
                "Already have an authenticated email.",
            )),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => {
                AuthError::field("email", "The email has already been taken.")
            },
            StoreError::NotFound => AuthError::UserNotFound,
            other => AuthError::StoreError(other.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::HashError(err.to_string())
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        AuthError::NotificationError(err.to_string())
    }
}

/// Unparseable bodies are reported like any other invalid input
impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        AuthError::field("body", "The request body must be a valid JSON object.")
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        }

        let response = AuthErrorResponse {
            success: false,
            error: ErrorDetail {
                code: self.error_code().to_string(),
                description: self.public_message(),
                retry_after: self.retry_after(),
            },
            message: self.public_message(),
            errors: self.field_errors(),
        };

        (status, Json(response)).into_response()
    }
}

/// Helper function to log authentication failures
pub fn log_auth_failure(user_email: &str, error: &AuthError, user_agent: Option<&str>) {
    tracing::warn!(
        email = user_email,
        user_agent = user_agent.unwrap_or("unknown"),
        error_code = error.error_code(),
        "Authentication failure"
    );
}
