//! Authentication service.
//!
//! Registration assembles an identity with the records its role needs;
//! login verifies the password and resolves which role the session acts as.

mod error;
mod password;

pub use error::{AuthError, ErrorKind};

use tracing::{error, info, instrument, warn};

use plated_core::{
    ActiveRole, Email, IdentityId, PasswordPolicy, RegistrationForm, RoleKind, ValidationError,
};

use crate::db::{AccountStore, NewAccount, RepositoryError};
use crate::models::Identity;

use self::password::{hash_password, reject_without_credential, verify_password};

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The authenticated identity.
    pub identity: Identity,
    /// The role selected for this session.
    pub active_role: ActiveRole,
}

/// Authentication service.
///
/// Handles registration, login, role resolution and password changes.
pub struct AuthService<'a> {
    store: &'a dyn AccountStore,
    policy: PasswordPolicy,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn AccountStore) -> Self {
        Self {
            store,
            policy: PasswordPolicy,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new identity with the records for its requested role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is invalid.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    /// Returns `AuthError::AdminExists` when registering a second admin.
    /// Returns `AuthError::Repository` if the write fails; nothing is kept.
    #[instrument(skip_all, fields(role = %form.role))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<IdentityId, AuthError> {
        let valid = form.validate(self.policy)?;

        if self.store.email_exists(&valid.email).await? {
            return Err(AuthError::EmailTaken);
        }
        if valid.role == RoleKind::Admin && self.store.admin_exists().await? {
            return Err(AuthError::AdminExists);
        }

        let password_hash = hash_password(valid.password).await?;

        let account = NewAccount {
            name: valid.name,
            email: valid.email,
            phone: valid.phone,
            password_hash,
            role: valid.role,
        };

        // The store re-checks both constraints inside its transaction
        let identity_id = self
            .store
            .create_account(&account)
            .await
            .map_err(|e| match e {
                RepositoryError::DuplicateEmail => AuthError::EmailTaken,
                RepositoryError::AdminExists => AuthError::AdminExists,
                other => AuthError::Repository(other),
            })?;

        info!(identity_id = %identity_id, role = %account.role, "Account registered");

        Ok(identity_id)
    }

    /// Whether the platform admin has been registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store can't be read.
    pub async fn admin_exists(&self) -> Result<bool, AuthError> {
        Ok(self.store.admin_exists().await?)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Login with email and password.
    ///
    /// Malformed emails, unknown emails and wrong passwords all produce the
    /// same `AuthError::InvalidCredentials` after the same Argon2 work.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::Integrity` if the identity's role records are broken.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Ok(email) = Email::parse(email) else {
            warn!("Login with malformed email");
            return Err(reject_without_credential(password.to_owned()).await);
        };

        let Some((identity, password_hash)) = self.store.find_credential(&email).await? else {
            warn!("Login for unknown email");
            return Err(reject_without_credential(password.to_owned()).await);
        };

        if let Err(e) = verify_password(password.to_owned(), password_hash).await {
            warn!(identity_id = %identity.id, "Login with wrong password");
            return Err(e);
        }

        let active_role = self.resolve_active_role(identity.id).await?;

        info!(
            identity_id = %identity.id,
            role = %active_role.kind(),
            "Login succeeded"
        );

        Ok(LoginOutcome {
            identity,
            active_role,
        })
    }

    /// Resolve the role an identity acts as.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the identity doesn't exist.
    /// Returns `AuthError::Integrity` if its role records are missing or
    /// inconsistent.
    pub async fn resolve_active_role(&self, id: IdentityId) -> Result<ActiveRole, AuthError> {
        if self.store.get_identity(id).await?.is_none() {
            return Err(AuthError::InvalidCredentials);
        }

        let roles = self.store.load_roles(id).await?;
        roles.resolve().map_err(|e| {
            error!(identity_id = %id, error = %e, "Role records are inconsistent");
            AuthError::Integrity(e)
        })
    }

    // =========================================================================
    // Password Management
    // =========================================================================

    /// Replace an identity's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the new password is mismatched or weak.
    /// Returns `AuthError::InvalidCredentials` if `current` is wrong.
    #[instrument(skip_all, fields(identity_id = %id))]
    pub async fn change_password(
        &self,
        id: IdentityId,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        if new != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        self.policy
            .validate(new)
            .map_err(ValidationError::WeakPassword)?;

        let stored = self
            .store
            .get_password_hash(id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(current.to_owned(), stored).await?;

        let password_hash = hash_password(new.to_owned()).await?;
        self.store.replace_password_hash(id, &password_hash).await?;

        info!("Password changed");

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryAccountStore;
    use plated_core::{PlannedRecord, StaffRole};

    fn form(email: &str, role: &str) -> RegistrationForm {
        RegistrationForm {
            name: "Test User".to_owned(),
            email: email.to_owned(),
            phone: None,
            password: "TestPass123!".to_owned(),
            confirm: "TestPass123!".to_owned(),
            role: role.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login_customer() {
        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);

        let id = auth
            .register(&form("c@test.com", "customer"))
            .await
            .unwrap();
        let outcome = auth.login("C@Test.com", "TestPass123!").await.unwrap();

        assert_eq!(outcome.identity.id, id);
        assert_eq!(outcome.active_role.kind(), RoleKind::Customer);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_emails_still_verify() {
        use std::sync::atomic::Ordering;

        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);
        auth.register(&form("known@test.com", "customer"))
            .await
            .unwrap();

        for email in ["nobody@test.com", "not-an-email"] {
            let before = password::DECOY_VERIFICATIONS.load(Ordering::SeqCst);
            let err = auth.login(email, "TestPass123!").await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials), "{email}");
            assert!(
                password::DECOY_VERIFICATIONS.load(Ordering::SeqCst) > before,
                "{email}"
            );
        }
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_write() {
        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);

        let mut weak = form("w@test.com", "customer");
        weak.password = "short".to_owned();
        weak.confirm = "short".to_owned();

        let err = auth.register(&weak).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.row_counts().await.total(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);

        auth.register(&form("dup@test.com", "customer"))
            .await
            .unwrap();
        let err = auth
            .register(&form("DUP@test.com", "driver"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_second_admin_is_conflict() {
        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);

        assert!(!auth.admin_exists().await.unwrap());
        auth.register(&form("a1@test.com", "admin")).await.unwrap();
        assert!(auth.admin_exists().await.unwrap());

        let err = auth
            .register(&form("a2@test.com", "admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AdminExists));
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_repository_error() {
        let store = MemoryAccountStore::new();
        store
            .fail_on(Some(PlannedRecord::Staff(StaffRole::Delivery)))
            .await;
        let auth = AuthService::new(&store);

        let err = auth
            .register(&form("d@test.com", "driver"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(store.row_counts().await.total(), 0);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);
        auth.register(&form("c@test.com", "customer"))
            .await
            .unwrap();

        let unknown = auth
            .login("nobody@test.com", "TestPass123!")
            .await
            .unwrap_err();
        let wrong = auth.login("c@test.com", "WrongPass123!").await.unwrap_err();
        let malformed = auth.login("not-an-email", "TestPass123!").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(malformed, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_orphaned_staff_is_integrity_error() {
        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);
        let id = auth
            .register(&form("c@test.com", "customer"))
            .await
            .unwrap();
        store.attach_staff(id, StaffRole::Delivery).await.unwrap();

        let err = auth.login("c@test.com", "TestPass123!").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[tokio::test]
    async fn test_resolve_unknown_identity() {
        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);

        let err = auth
            .resolve_active_role(IdentityId::new(42))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_change_password() {
        let store = MemoryAccountStore::new();
        let auth = AuthService::new(&store);
        let id = auth
            .register(&form("c@test.com", "customer"))
            .await
            .unwrap();

        let wrong_current = auth
            .change_password(id, "Nope1234!", "NewPass456?", "NewPass456?")
            .await
            .unwrap_err();
        assert!(matches!(wrong_current, AuthError::InvalidCredentials));

        let weak = auth
            .change_password(id, "TestPass123!", "newpass", "newpass")
            .await
            .unwrap_err();
        assert_eq!(weak.kind(), ErrorKind::Validation);

        auth.change_password(id, "TestPass123!", "NewPass456?", "NewPass456?")
            .await
            .unwrap();

        assert!(auth.login("c@test.com", "TestPass123!").await.is_err());
        assert!(auth.login("c@test.com", "NewPass456?").await.is_ok());
    }
}
