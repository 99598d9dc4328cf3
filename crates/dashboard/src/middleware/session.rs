//! Session middleware configuration.
//!
//! Sessions are in-memory: the dashboard holds no persistence layer, and the
//! session only carries the bearer token plus per-operator view state, both
//! of which are recreated by signing in again after a restart.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::DashboardConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "middify_dashboard_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with the in-memory store.
#[must_use]
pub fn create_session_layer(config: &DashboardConfig) -> SessionManagerLayer<MemoryStore> {
    let store = MemoryStore::default();

    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
