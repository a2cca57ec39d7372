//! Authentication route handlers.
//!
//! JSON endpoints for registration, password login, logout and password
//! changes. The session only ever holds a [`CurrentUser`].

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use plated_core::{ActiveRole, Email, IdentityId, RegistrationForm};

use super::dashboard::dashboard_path;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm: String,
}

/// Response to a successful registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredResponse {
    pub identity_id: IdentityId,
}

/// The logged-in user plus where their dashboard lives.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserResponse {
    pub identity_id: IdentityId,
    pub name: String,
    pub email: Email,
    pub active_role: ActiveRole,
    pub dashboard: &'static str,
}

impl From<CurrentUser> for SessionUserResponse {
    fn from(user: CurrentUser) -> Self {
        Self {
            identity_id: user.identity_id,
            name: user.name,
            email: user.email,
            dashboard: dashboard_path(user.active_role.kind()),
            active_role: user.active_role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminExistsResponse {
    pub admin_exists: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle registration.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegistrationForm>,
) -> Result<impl IntoResponse> {
    let identity_id = state.auth().register(&form).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse { identity_id }),
    ))
}

/// Handle login.
///
/// Stores the resolved user in the session and returns it.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<SessionUserResponse>> {
    let outcome = state.auth().login(&body.email, &body.password).await?;

    let user = CurrentUser {
        identity_id: outcome.identity.id,
        name: outcome.identity.name,
        email: outcome.identity.email,
        active_role: outcome.active_role,
    };

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.identity_id, Some(user.email.as_str()));

    Ok(Json(user.into()))
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Return the current session user.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<SessionUserResponse> {
    Json(user.into())
}

/// Report whether the platform admin exists.
pub async fn admin_exists(State(state): State<AppState>) -> Result<Json<AdminExistsResponse>> {
    let admin_exists = state.auth().admin_exists().await?;
    Ok(Json(AdminExistsResponse { admin_exists }))
}

/// Change the logged-in user's password.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    state
        .auth()
        .change_password(
            user.identity_id,
            &body.current_password,
            &body.new_password,
            &body.confirm,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
