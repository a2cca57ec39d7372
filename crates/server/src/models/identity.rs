//! Identity domain type.
//!
//! Validated domain object, separate from the database row types in `db`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use plated_core::{Email, IdentityId};

/// The base account shared by every role an identity holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique identity ID.
    pub id: IdentityId,
    /// Display name.
    pub name: String,
    /// Contact email, also the login handle.
    pub email: Email,
    /// Optional phone number.
    pub phone: Option<String>,
    /// When the identity registered.
    pub created_at: DateTime<Utc>,
}
