//! What a logged-in session carries.

use serde::{Deserialize, Serialize};

use plated_core::{ActiveRole, Email, IdentityId};

/// Session-stored user identity.
///
/// Written once at login and handed to handlers through the `RequireAuth`
/// extractor; nothing else holds "the current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub identity_id: IdentityId,
    pub name: String,
    pub email: Email,
    /// Role resolved at login.
    pub active_role: ActiveRole,
}

/// Session map keys.
pub mod keys {
    pub const CURRENT_USER: &str = "current_user";
}
