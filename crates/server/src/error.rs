//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use plated_core::ValidationError;

use crate::services::auth::{AuthError, ErrorKind};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// User is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body is not the JSON shape the route expects.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
                ErrorKind::Integrity | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing body. Server errors never expose their details.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            Self::Auth(err) => match err {
                AuthError::Validation(ValidationError::WeakPassword(policy)) => (
                    "Password does not meet requirements".to_string(),
                    policy.messages().into_iter().map(String::from).collect(),
                ),
                AuthError::Validation(v) => (v.to_string(), Vec::new()),
                AuthError::EmailTaken => (
                    "An account with this email already exists".to_string(),
                    Vec::new(),
                ),
                AuthError::AdminExists => {
                    ("An admin account already exists".to_string(), Vec::new())
                }
                AuthError::InvalidCredentials => ("Invalid credentials".to_string(), Vec::new()),
                AuthError::Integrity(_) => (
                    "Account configuration error, please contact support".to_string(),
                    Vec::new(),
                ),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    ("Internal server error".to_string(), Vec::new())
                }
            },
            Self::Unauthorized => ("Authentication required".to_string(), Vec::new()),
            Self::BadRequest(msg) => (msg.clone(), Vec::new()),
            Self::Session(_) => ("Internal server error".to_string(), Vec::new()),
        };

        ErrorBody { error, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after successful authentication.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
