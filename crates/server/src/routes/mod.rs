//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the account store)
//!
//! # Auth
//! POST /auth/register          - Create an account for one role
//! POST /auth/login             - Password login, resolves the active role
//! POST /auth/logout            - Drop the session
//! GET  /auth/me                - Current session user
//! GET  /auth/admin-exists      - Whether the platform admin is registered
//! POST /auth/password          - Change password (requires auth)
//!
//! # Dashboard
//! GET  /dashboard              - Redirect to the active role's dashboard
//! ```

pub mod auth;
pub mod dashboard;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::rate_limit::RateLimiterLayer;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/admin-exists", get(auth::admin_exists))
        .route("/password", post(auth::change_password))
}

/// Build all application routes.
///
/// `auth_limiter` is applied to the `/auth` routes only.
pub fn routes(auth_limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    let auth = match auth_limiter {
        Some(limiter) => auth_routes().layer(limiter),
        None => auth_routes(),
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/dashboard", get(dashboard::redirect))
        .nest("/auth", auth)
}
