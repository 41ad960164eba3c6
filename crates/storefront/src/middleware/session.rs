//! Session middleware configuration.
//!
//! Sessions live in a bounded moka cache. They only hold the checkout id and
//! the customer token, so a restart costs the shopper a login and nothing else.

use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_moka_store::MokaStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "abacate_session";

/// A cart left alone this long is forgotten.
const IDLE_DAYS: i64 = 7;

/// Upper bound on live sessions; the least recently used go first.
const MAX_SESSIONS: u64 = 100_000;

/// Store that drops each record at its expiry date.
fn session_store() -> MokaStore {
    MokaStore::new(Some(MAX_SESSIONS))
}

/// Cookie-backed sessions over a [`MokaStore`].
///
/// `Lax` keeps the cookie on the redirect back from Google sign-in.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MokaStore> {
    SessionManagerLayer::new(session_store())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(IDLE_DAYS)))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
}
