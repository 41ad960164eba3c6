//! Shopper extractors.
//!
//! [`Shopper`] reads the checkout id and customer token from the session and
//! turns them into a [`ShopperContext`] for commerce calls. [`RequireCustomer`]
//! additionally redirects anonymous shoppers to the login page.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::commerce::{CustomerToken, ShopperContext};
use crate::models::session_keys;

/// The current shopper: their session and remote identifiers.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(State(state): State<AppState>, shopper: Shopper) -> Result<..> {
///     let cart = state.commerce().cart(&shopper.ctx).await?;
///     shopper.remember_checkout_id(&cart.checkout_id).await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Shopper {
    pub session: Session,
    pub ctx: ShopperContext,
}

impl Shopper {
    /// Store the checkout id assigned by the platform, if it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn remember_checkout_id(
        &mut self,
        checkout_id: &str,
    ) -> Result<(), tower_sessions::session::Error> {
        if self.ctx.checkout_id.as_deref() == Some(checkout_id) {
            return Ok(());
        }
        self.session
            .insert(session_keys::CHECKOUT_ID, checkout_id)
            .await?;
        self.ctx.checkout_id = Some(checkout_id.to_string());
        Ok(())
    }

    /// Whether a customer is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.ctx.is_logged_in()
    }
}

/// Error returned when a shopper extractor rejects the request.
pub enum AuthRejection {
    /// Redirect to the login page, returning to `path` afterwards.
    RedirectToLogin(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// The session layer is missing from the stack.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(path) => {
                let target = format!("/login?returnUrl={}", urlencoding::encode(&path));
                Redirect::to(&target).into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::MissingSession)?;

        let checkout_id: Option<String> = session
            .get(session_keys::CHECKOUT_ID)
            .await
            .ok()
            .flatten();
        let customer_token: Option<CustomerToken> = session
            .get(session_keys::CUSTOMER_TOKEN)
            .await
            .ok()
            .flatten();

        Ok(Self {
            session,
            ctx: ShopperContext {
                checkout_id,
                customer_token,
            },
        })
    }
}

/// Extractor that requires a logged-in customer.
///
/// Anonymous shoppers are redirected to `/login?returnUrl=<path>`.
pub struct RequireCustomer(pub Shopper);

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shopper = Shopper::from_request_parts(parts, state).await?;

        if shopper.is_logged_in() {
            return Ok(Self(shopper));
        }

        let path = parts.uri.path();
        if path.starts_with("/api/") {
            Err(AuthRejection::Unauthorized)
        } else {
            Err(AuthRejection::RedirectToLogin(path.to_string()))
        }
    }
}

/// Helper to store the customer token in the session (login).
///
/// Cycles the session id to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_customer_token(
    session: &Session,
    token: &CustomerToken,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CUSTOMER_TOKEN, token).await
}

/// Helper to clear the customer token from the session (logout).
///
/// The checkout id is kept so the cart survives logout.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_customer_token(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CustomerToken>(session_keys::CUSTOMER_TOKEN)
        .await?;
    Ok(())
}

/// Accept only same-site relative paths as a post-login destination.
#[must_use]
pub fn safe_return_url(raw: Option<&str>) -> Option<String> {
    let url = raw?.trim();
    let is_relative = url.starts_with('/') && !url.starts_with("//") && !url.contains('\\');
    (is_relative && !url.contains("://")).then(|| url.to_string())
}
