//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Redirect to the cart
//!
//! # Cart
//! GET  /carrinho                          - Cart page (empty-cart page when no lines)
//! POST /carrinho/itens/{variant}          - Update line quantity (0 removes)
//! POST /carrinho/frete                    - Shipping estimate by CEP
//! POST /carrinho/frete/selecionar         - Select shipping quote
//! POST /carrinho/cupom                    - Apply coupon
//!
//! # Shipping (requires login)
//! GET  /frete                             - Addresses, quotes and gift wrap
//! POST /frete/enderecos                   - Create address
//! POST /frete/enderecos/{id}/selecionar   - Select address
//! POST /frete/selecionar                  - Select shipping quote
//! POST /frete/presente                    - Gift-wrap lines
//! POST /frete/cupom                       - Apply or remove coupon
//! POST /frete/itens/{variant}             - Update line quantity
//!
//! # Payment (requires login and a shipping quote)
//! GET  /pagamento                         - Payment methods and installments
//! POST /pagamento/metodo                  - Select payment method
//! POST /pagamento/parcelas                - Select installment
//! POST /pagamento/cupom                   - Apply or remove coupon
//! POST /pagamento/itens/{variant}         - Update line quantity
//! POST /pagamento/finalizar               - Place the order
//!
//! # Confirmation
//! GET  /confirmacao?id=                   - Order summary
//!
//! # Auth (rate limited)
//! GET  /login                             - Login page
//! POST /login                             - Login action
//! GET  /login/google                      - Redirect to Google OAuth
//! GET  /callback/google                   - Handle OAuth callback
//! GET  /signup                            - Signup page (`?partial=true` for the short form)
//! POST /signup/pessoa                     - Person signup
//! POST /signup/empresa                    - Company signup
//! POST /logout                            - Logout action
//!
//! # JSON API (rate limited)
//! GET  /api/cep/{cep}                     - CEP lookup
//! GET  /api/carrinho/quantidade           - Cart item count
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod confirmation;
pub mod payment;
pub mod shipping;
pub mod signup;

use abacate_core::ProductVariantId;
use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tracing::warn;

use crate::commerce::{Cart, CommerceError, UpdateItemInput, User};
use crate::error::{AppError, Result};
use crate::middleware::{Shopper, api_rate_limiter, auth_rate_limiter, clear_customer_token};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/carrinho", get(cart::show))
        .route("/carrinho/itens/{variant}", post(cart::update_quantity))
        .route("/carrinho/frete", post(cart::estimate_shipping))
        .route("/carrinho/frete/selecionar", post(cart::select_shipping))
        .route("/carrinho/cupom", post(cart::apply_coupon))
}

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/frete", get(shipping::show))
        .route("/frete/enderecos", post(shipping::create_address))
        .route(
            "/frete/enderecos/{id}/selecionar",
            post(shipping::select_address),
        )
        .route("/frete/selecionar", post(shipping::select_shipping))
        .route("/frete/presente", post(shipping::gift_wrap))
        .route("/frete/cupom", post(shipping::toggle_coupon))
        .route("/frete/itens/{variant}", post(shipping::update_quantity))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/pagamento", get(payment::show))
        .route("/pagamento/metodo", post(payment::select_method))
        .route("/pagamento/parcelas", post(payment::select_installment))
        .route("/pagamento/cupom", post(payment::toggle_coupon))
        .route("/pagamento/itens/{variant}", post(payment::update_quantity))
        .route("/pagamento/finalizar", post(payment::finalize))
        .route("/confirmacao", get(confirmation::show))
}

/// Create the auth routes router.
///
/// Only the form submissions are rate limited; the pages are not.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route("/login/google", get(auth::google_login))
        .route(
            "/callback/google",
            get(auth::google_callback).layer(auth_rate_limiter()),
        )
        .route("/logout", post(auth::logout))
        .route("/signup", get(signup::signup_page))
        .route(
            "/signup/pessoa",
            post(signup::signup_person).layer(auth_rate_limiter()),
        )
        .route(
            "/signup/empresa",
            post(signup::signup_company).layer(auth_rate_limiter()),
        )
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cep/{cep}", get(api::cep_lookup))
        .route("/api/carrinho/quantidade", get(api::cart_count))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/carrinho") }))
        .merge(cart_routes())
        .merge(shipping_routes())
        .merge(payment_routes())
        .merge(auth_routes())
        .merge(api_routes())
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Load the shopper's cart and remember its checkout id.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or the session written.
pub(crate) async fn load_cart(state: &AppState, shopper: &mut Shopper) -> Result<Cart> {
    let cart = state.commerce().cart(&shopper.ctx).await?;
    shopper.remember_checkout_id(&cart.checkout_id).await?;
    Ok(cart)
}

/// Load the logged-in customer.
///
/// A token the platform no longer accepts is dropped from the session so the
/// step guards send the shopper back to the login page.
///
/// # Errors
///
/// Returns an error if the platform call fails for another reason.
pub(crate) async fn load_user(state: &AppState, shopper: &mut Shopper) -> Result<Option<User>> {
    match state.commerce().user(&shopper.ctx).await {
        Ok(Some(user)) => Ok(Some(user)),
        Ok(None) if !shopper.is_logged_in() => Ok(None),
        Ok(None) | Err(CommerceError::NotFound(_)) => {
            warn!("Customer token rejected, clearing it");
            clear_customer_token(&shopper.session).await?;
            shopper.ctx.customer_token = None;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Make sure the session knows the checkout id before a cart action.
pub(crate) async fn ensure_checkout(state: &AppState, shopper: &mut Shopper) -> Result<()> {
    if shopper.ctx.checkout_id.is_none() {
        load_cart(state, shopper).await?;
    }
    Ok(())
}

/// Set a line's quantity.
pub(crate) async fn change_quantity(
    state: &AppState,
    shopper: &mut Shopper,
    variant: ProductVariantId,
    quantity: u32,
) -> Result<()> {
    ensure_checkout(state, shopper).await?;
    let input = UpdateItemInput::new(variant, quantity);
    state.commerce().update_item(&input, &shopper.ctx).await?;
    Ok(())
}

/// Apply `code`, or remove the cart's coupon when it already has one.
pub(crate) async fn toggle_coupon(
    state: &AppState,
    shopper: &mut Shopper,
    code: &str,
) -> Result<()> {
    let cart = load_cart(state, shopper).await?;

    match cart.coupon.as_deref().filter(|c| !c.is_empty()) {
        Some(applied) => {
            state.commerce().remove_coupon(applied, &shopper.ctx).await?;
        }
        None => {
            state.commerce().add_coupon(code.trim(), &shopper.ctx).await?;
        }
    }
    Ok(())
}

/// Replace a blank form field with a looked-up value.
pub(crate) fn fill_blank(field: &mut String, value: Option<String>) {
    if field.trim().is_empty()
        && let Some(value) = value
    {
        *field = value;
    }
}

/// Redirect to `path` after an action.
///
/// A rejection by the platform (bad coupon, out of stock) goes back to
/// `path` with `code`; any other failure is an error page.
pub(crate) fn redirect_after(result: Result<()>, path: &str, code: &str) -> Result<Redirect> {
    match result {
        Ok(()) => Ok(Redirect::to(path)),
        Err(AppError::Commerce(CommerceError::UserError(message))) => {
            warn!(%message, code, "Action rejected by the commerce platform");
            Ok(redirect_with_error(path, code))
        }
        Err(e) => Err(e),
    }
}

/// Redirect back to `path` with an error code for the page to display.
pub(crate) fn redirect_with_error(path: &str, code: &str) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{path}{separator}error={code}"))
}

/// Portuguese message for an error code carried in the query string.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "cep" => "CEP inválido.",
        "cep-not-found" => "CEP não encontrado.",
        "shipping" => "Não foi possível calcular o frete.",
        "coupon" => "Cupom inválido.",
        "quantity" => "Não foi possível atualizar a quantidade.",
        "address" => "Não foi possível cadastrar o endereço.",
        "phone" => "Telefone inválido.",
        "gift" => "Não foi possível aplicar a embalagem para presente.",
        "payment-method" => "Selecione uma forma de pagamento.",
        "installment" => "Não foi possível selecionar o parcelamento.",
        "card" => "Dados do cartão inválidos.",
        "cpf" => "CPF inválido.",
        "cnpj" => "CNPJ inválido.",
        "checkout" => "Não foi possível finalizar a compra.",
        "credentials" => "E-mail ou senha inválidos.",
        "google" => "Não foi possível entrar com o Google.",
        "google-unavailable" => "Login com o Google indisponível.",
        "password" => "As senhas não conferem.",
        "birth-date" => "Data de nascimento inválida.",
        "signup" => "Não foi possível concluir o cadastro.",
        "session" => "Sua sessão expirou. Tente novamente.",
        _ => "Ocorreu um erro. Tente novamente.",
    }
}
