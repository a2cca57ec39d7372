//! Role dashboard routing.

use axum::response::Redirect;

use plated_core::RoleKind;

use crate::middleware::RequireAuth;

/// Landing page for each role.
#[must_use]
pub const fn dashboard_path(role: RoleKind) -> &'static str {
    match role {
        RoleKind::Admin => "/admin/dashboard",
        RoleKind::Manager => "/manager/dashboard",
        RoleKind::Driver => "/driver/dashboard",
        RoleKind::Customer => "/customer/dashboard",
    }
}

/// Send the logged-in user to their active role's dashboard.
pub async fn redirect(RequireAuth(user): RequireAuth) -> Redirect {
    Redirect::to(dashboard_path(user.active_role.kind()))
}
