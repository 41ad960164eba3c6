//! Session-related types.
//!
//! The session only holds remote identifiers. Carts, users and orders are
//! refetched from the commerce platform on every request.

/// Session keys for shopper state.
pub mod keys {
    /// Key for the commerce platform checkout (cart) id.
    pub const CHECKOUT_ID: &str = "checkout_id";

    /// Key for the customer access token issued on login or signup.
    pub const CUSTOMER_TOKEN: &str = "customer_token";

    /// Key for Google OAuth state (CSRF protection).
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";

    /// Key for the page to return to after login.
    pub const RETURN_URL: &str = "return_url";
}
