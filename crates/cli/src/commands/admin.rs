//! Platform admin bootstrap commands.
//!
//! The admin goes through the same registration path as the HTTP API, so the
//! singleton and password rules apply unchanged.

use plated_core::{IdentityId, RegistrationForm, RoleKind};
use plated_server::db::{PgAccountStore, create_pool};
use plated_server::services::AuthService;

use super::{CommandError, database_url};

async fn store() -> Result<PgAccountStore, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(PgAccountStore::new(create_pool(&url).await?))
}

/// Register the platform admin.
///
/// # Errors
///
/// Returns `CommandError::Auth` if the input is invalid, the email is taken
/// or an admin already exists.
pub async fn create(
    name: &str,
    email: &str,
    phone: Option<String>,
    password: &str,
) -> Result<IdentityId, CommandError> {
    let store = store().await?;

    let form = RegistrationForm {
        name: name.to_owned(),
        email: email.to_owned(),
        phone,
        password: password.to_owned(),
        confirm: password.to_owned(),
        role: RoleKind::Admin.as_str().to_owned(),
    };

    let identity_id = AuthService::new(&store).register(&form).await?;

    tracing::info!(identity_id = %identity_id, email, "Admin created");
    Ok(identity_id)
}

/// Whether the platform admin exists.
pub async fn exists() -> Result<bool, CommandError> {
    let store = store().await?;
    Ok(AuthService::new(&store).admin_exists().await?)
}
