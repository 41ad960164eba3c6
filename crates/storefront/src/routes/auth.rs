//! Authentication route handlers.
//!
//! Login with email (or CPF/CNPJ) and password, Google sign-in and logout.
//! Credentials are checked by the commerce platform; the storefront only keeps
//! the returned customer token in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::error_message;
use crate::commerce::{
    CommerceError, CustomerAccessToken, CustomerToken, LoginInput, SocialLoginGoogleInput,
};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{Shopper, clear_customer_token, safe_return_url, set_customer_token};
use crate::models::session_keys;
use crate::state::AppState;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Where shoppers land after login when no return URL is given.
const DEFAULT_RETURN: &str = "/carrinho";

// =============================================================================
// Form and Query Types
// =============================================================================

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
    pub error: Option<String>,
}

/// Login form data.
///
/// No `Debug`: the form carries the password.
#[derive(Deserialize)]
pub struct LoginForm {
    /// Email, CPF or CNPJ.
    pub input: String,
    pub pass: String,
    #[serde(default)]
    pub return_url: Option<String>,
}

/// Query parameters from the Google OAuth callback.
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub return_url: String,
    pub google_enabled: bool,
    pub google_url: String,
    pub signup_url: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Build a login page URL that keeps the return URL across retries.
pub(crate) fn login_url(return_url: Option<&str>, error: Option<&str>) -> String {
    let mut params = Vec::new();
    if let Some(code) = error {
        params.push(format!("error={code}"));
    }
    if let Some(url) = safe_return_url(return_url) {
        params.push(format!("returnUrl={}", urlencoding::encode(&url)));
    }

    if params.is_empty() {
        "/login".to_string()
    } else {
        format!("/login?{}", params.join("&"))
    }
}

/// Generate a random alphanumeric string for the OAuth `state` parameter.
fn generate_oauth_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// The redirect URI registered for Google sign-in.
fn google_redirect_uri(base_url: &str) -> String {
    format!("{base_url}/callback/google")
}

/// Store the token, attach the cart to the customer and leave the login flow.
///
/// Shared by password login, Google sign-in and signup.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub(crate) async fn complete_login(
    state: &AppState,
    shopper: &mut Shopper,
    access: CustomerAccessToken,
    return_url: Option<&str>,
) -> Result<Redirect> {
    let token = CustomerToken::new(access.token);
    set_customer_token(&shopper.session, &token).await?;
    shopper.ctx.customer_token = Some(token);

    if shopper.ctx.checkout_id.is_some()
        && let Err(e) = state.commerce().associate_checkout(&shopper.ctx).await
    {
        warn!(error = %e, "Failed to associate the checkout with the customer");
    }

    match state.commerce().user(&shopper.ctx).await {
        Ok(Some(user)) => {
            set_sentry_user(user.id.as_deref(), Some(&user.email));
            info!(user_id = ?user.id, "Customer logged in");
        }
        Ok(None) => warn!("Login succeeded but the platform returned no user"),
        Err(e) => warn!(error = %e, "Failed to load the customer after login"),
    }

    let target = safe_return_url(return_url).unwrap_or_else(|| DEFAULT_RETURN.to_string());
    Ok(Redirect::to(&target))
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(state))]
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> LoginTemplate {
    let return_url = safe_return_url(query.return_url.as_deref()).unwrap_or_default();
    let with_return = |path: &str| {
        if return_url.is_empty() {
            path.to_string()
        } else {
            format!("{path}?returnUrl={}", urlencoding::encode(&return_url))
        }
    };

    LoginTemplate {
        error: query.error.as_deref().map(|c| error_message(c).to_string()),
        google_enabled: state.config().google_client_id.is_some(),
        google_url: with_return("/login/google"),
        signup_url: with_return("/signup"),
        return_url,
    }
}

/// Handle login form submission.
#[instrument(skip(state, shopper, form))]
pub async fn login(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let return_url = form.return_url.as_deref();
    let input = LoginInput {
        input: form.input.trim().to_string(),
        pass: form.pass,
    };

    match state.commerce().login(&input, &shopper.ctx).await {
        Ok(access) => complete_login(&state, &mut shopper, access, return_url).await,
        Err(CommerceError::UserError(message) | CommerceError::NotFound(message)) => {
            warn!(%message, "Login rejected");
            Ok(Redirect::to(&login_url(return_url, Some("credentials"))))
        }
        Err(e) => Err(e.into()),
    }
}

/// Start Google sign-in.
///
/// Stores a CSRF state and the return URL in the session, then redirects to
/// Google's consent page.
#[instrument(skip(state, shopper))]
pub async fn google_login(
    State(state): State<AppState>,
    shopper: Shopper,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect> {
    let Some(client_id) = state.config().google_client_id.as_deref() else {
        return Ok(Redirect::to(&login_url(
            query.return_url.as_deref(),
            Some("google-unavailable"),
        )));
    };

    let oauth_state = generate_oauth_state();
    shopper
        .session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await?;
    if let Some(url) = safe_return_url(query.return_url.as_deref()) {
        shopper.session.insert(session_keys::RETURN_URL, url).await?;
    }

    let redirect_uri = google_redirect_uri(&state.config().base_url);
    let auth_url = url::Url::parse_with_params(
        GOOGLE_AUTH_URL,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", oauth_state.as_str()),
        ],
    )
    .map_err(|e| AppError::Internal(format!("Google auth URL: {e}")))?;

    Ok(Redirect::to(auth_url.as_str()))
}

/// Handle the Google OAuth callback.
///
/// The authorization code is exchanged by the commerce platform, which
/// returns a customer token like a password login does.
#[instrument(skip(state, shopper, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Query(query): Query<GoogleCallbackQuery>,
) -> Result<Redirect> {
    let stored_state: Option<String> = shopper
        .session
        .remove(session_keys::GOOGLE_OAUTH_STATE)
        .await?;
    let return_url: Option<String> = shopper.session.remove(session_keys::RETURN_URL).await?;
    let failed = || Redirect::to(&login_url(return_url.as_deref(), Some("google")));

    if let Some(error) = &query.error {
        warn!(%error, "Google sign-in denied");
        return Ok(failed());
    }
    let Some(code) = query.code else {
        warn!("Google callback missing code");
        return Ok(failed());
    };
    if stored_state.is_none() || stored_state != query.state {
        warn!("Google OAuth state mismatch");
        return Ok(failed());
    }

    let input = SocialLoginGoogleInput {
        code,
        redirect_uri: google_redirect_uri(&state.config().base_url),
    };
    match state.commerce().social_login_google(&input, &shopper.ctx).await {
        Ok(access) => complete_login(&state, &mut shopper, access, return_url.as_deref()).await,
        Err(CommerceError::UserError(message)) => {
            warn!(%message, "Google sign-in rejected");
            Ok(failed())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out.
///
/// The checkout id stays in the session so the cart survives.
#[instrument(skip(state, shopper))]
pub async fn logout(State(state): State<AppState>, mut shopper: Shopper) -> Result<Redirect> {
    if shopper.is_logged_in()
        && let Err(e) = state.commerce().logout(&shopper.ctx).await
    {
        warn!(error = %e, "Platform logout failed");
    }

    clear_customer_token(&shopper.session).await?;
    shopper.ctx.customer_token = None;
    clear_sentry_user();

    Ok(Redirect::to(DEFAULT_RETURN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_keeps_return_url() {
        assert_eq!(login_url(None, None), "/login");
        assert_eq!(
            login_url(Some("/frete"), Some("credentials")),
            "/login?error=credentials&returnUrl=%2Ffrete"
        );
        assert_eq!(
            login_url(Some("https://evil.example"), Some("google")),
            "/login?error=google"
        );
    }

    #[test]
    fn test_oauth_state_is_random_alphanumeric() {
        let first = generate_oauth_state();
        let second = generate_oauth_state();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_google_redirect_uri() {
        assert_eq!(
            google_redirect_uri("https://loja.example"),
            "https://loja.example/callback/google"
        );
    }
}
