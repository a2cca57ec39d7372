//! Argon2id hashing on the blocking thread pool.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Hash a password using Argon2id.
pub(super) async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    })
    .await
    .map_err(|_| AuthError::PasswordHash)?
}

/// Verify a password against a stored PHC hash.
///
/// A hash that fails to parse counts as a mismatch.
pub(super) async fn verify_password(password: String, hash: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    })
    .await
    .map_err(|_| AuthError::PasswordHash)?
}

/// Argon2id hash of a throwaway password, made with the same parameters as
/// real credentials. Salt is fixed so building it cannot fail on entropy.
static DECOY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::from_b64("cGxhdGVkLWRlY295LXNhbHQ").ok()?;
    Argon2::default()
        .hash_password(b"plated-decoy-password", &salt)
        .ok()
        .map(|hash| hash.to_string())
});

#[cfg(test)]
pub(super) static DECOY_VERIFICATIONS: std::sync::atomic::AtomicUsize =
    std::sync::atomic::AtomicUsize::new(0);

/// Spend one full verification on a login that has no credential, then fail.
///
/// Unknown accounts cost the same Argon2 work as a wrong password, so the
/// response time does not reveal whether the email is registered.
pub(super) async fn reject_without_credential(password: String) -> AuthError {
    #[cfg(test)]
    DECOY_VERIFICATIONS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

    let outcome = tokio::task::spawn_blocking(move || {
        let Some(hash) = DECOY_HASH.as_deref() else {
            return;
        };
        if let Ok(parsed) = PasswordHash::new(hash) {
            let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
        }
    })
    .await;

    match outcome {
        Ok(()) => AuthError::InvalidCredentials,
        Err(_) => AuthError::PasswordHash,
    }
}
