//! Account storage.
//!
//! # Database: `plated`
//!
//! ## Tables (schema `account`)
//!
//! - `identity` - One row per person, unique lowercase email
//! - `credential` - Argon2id password hash, one per identity
//! - `customer` - Customer role record
//! - `staff` - Shared base record for managers and drivers
//! - `manager` / `delivery_agent` - Staff-dependent role records
//! - `admin` - At most one row, enforced by a unique constant column
//! - `restaurant` - Referenced by staff records
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p plated-cli -- migrate
//! ```

pub mod accounts;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use plated_core::{Email, IdentityId, RoleKind, RoleSet};

use crate::models::Identity;

pub use accounts::PgAccountStore;
pub use memory::{MemoryAccountStore, RowCounts};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-sqlx storage backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique email constraint violated.
    #[error("email already exists")]
    DuplicateEmail,

    /// Admin singleton constraint violated.
    #[error("admin already exists")]
    AdminExists,
}

/// A fully validated account ready to be written.
#[derive(Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: RoleKind,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Storage contract consumed by the auth service.
///
/// Implementations must make [`AccountStore::create_account`] atomic: either
/// every row of the role's record plan exists afterwards, or none does.
/// Email uniqueness and the admin singleton must be enforced inside that same
/// unit of work, not only by earlier reads.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Whether an identity with this email exists.
    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError>;

    /// Whether the admin record exists.
    async fn admin_exists(&self) -> Result<bool, RepositoryError>;

    /// Write the identity, credential and role records for `account`.
    ///
    /// Returns `RepositoryError::DuplicateEmail` or
    /// `RepositoryError::AdminExists` when a constraint is hit; nothing is
    /// written in that case.
    async fn create_account(&self, account: &NewAccount) -> Result<IdentityId, RepositoryError>;

    /// Look up an identity and its password hash by email.
    ///
    /// Returns `None` if the identity doesn't exist or has no credential.
    async fn find_credential(
        &self,
        email: &Email,
    ) -> Result<Option<(Identity, String)>, RepositoryError>;

    /// Get an identity by ID.
    async fn get_identity(&self, id: IdentityId) -> Result<Option<Identity>, RepositoryError>;

    /// Get the password hash for an identity.
    async fn get_password_hash(&self, id: IdentityId) -> Result<Option<String>, RepositoryError>;

    /// Load every role and staff record attached to an identity.
    async fn load_roles(&self, id: IdentityId) -> Result<RoleSet, RepositoryError>;

    /// Replace an identity's password hash.
    ///
    /// Returns `RepositoryError::NotFound` if the identity has no credential.
    async fn replace_password_hash(
        &self,
        id: IdentityId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
