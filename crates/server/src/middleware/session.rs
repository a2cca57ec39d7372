//! Cookie session layer.

use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "plated_session";

/// Sessions end after a week without requests.
const IDLE_TIMEOUT: Duration = Duration::days(7);

/// Session layer over `store`.
///
/// The server passes a `PostgresStore`, tests a `MemoryStore`. The cookie
/// is `Secure` whenever the public base URL is https.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &ServerConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_path("/")
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(config.secure_cookies())
        .with_expiry(Expiry::OnInactivity(IDLE_TIMEOUT))
}
