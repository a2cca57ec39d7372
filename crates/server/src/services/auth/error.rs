//! Authentication error types.

use thiserror::Error;

use plated_core::{RoleIntegrityError, ValidationError};

use crate::db::RepositoryError;

/// Coarse classification used for logging and HTTP status selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent bad input.
    Validation,
    /// The request collides with existing state.
    Conflict,
    /// Unknown email or wrong password.
    Authentication,
    /// Stored role records are inconsistent.
    Integrity,
    /// Storage or hashing failure.
    Internal,
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration or password-change input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Email already registered.
    #[error("email already registered")]
    EmailTaken,

    /// The platform already has its admin.
    #[error("an admin account already exists")]
    AdminExists,

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Role records for the identity don't form a valid set.
    #[error("role integrity error: {0}")]
    Integrity(#[from] RoleIntegrityError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::EmailTaken | Self::AdminExists => ErrorKind::Conflict,
            Self::InvalidCredentials => ErrorKind::Authentication,
            Self::Integrity(_) => ErrorKind::Integrity,
            Self::Repository(_) | Self::PasswordHash => ErrorKind::Internal,
        }
    }
}
