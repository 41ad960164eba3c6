//! Cart route handlers.
//!
//! The cart page lists the lines enriched with catalog data, lets the shopper
//! change quantities, apply a coupon and estimate shipping by CEP. Every
//! action redirects back so the page always renders a fresh remote snapshot.

use abacate_core::{Cep, ProductVariantId};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{
    change_quantity, ensure_checkout, error_message, load_cart, load_user, redirect_after,
    redirect_with_error,
};
use crate::commerce::ShippingSimulationInput;
use crate::error::Result;
use crate::filters;
use crate::middleware::Shopper;
use crate::services::checkout::{load_cart_lines, simulate_shipping};
use crate::state::AppState;
use crate::views::{
    BreadcrumbView, LineView, ShippingOptionView, Step, SummaryView, shipping_options,
};

const CART_PATH: &str = "/carrinho";

// =============================================================================
// Form and Query Types
// =============================================================================

/// Query parameters of the cart page.
#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    /// CEP of the last shipping estimate.
    pub cep: Option<String>,
    pub error: Option<String>,
}

/// Quantity form data (`0` removes the line).
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: u32,
}

/// Shipping estimate form data.
#[derive(Debug, Deserialize)]
pub struct EstimateForm {
    pub cep: String,
}

/// Shipping selection form data.
#[derive(Debug, Deserialize)]
pub struct SelectShippingForm {
    pub shipping_quote_id: String,
    #[serde(default)]
    pub cep: Option<String>,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub coupon: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub breadcrumb: BreadcrumbView,
    pub lines: Vec<LineView>,
    pub summary: SummaryView,
    /// Coupon reported by the `checkoutCoupon` loader; disables the form.
    pub applied_coupon: Option<String>,
    /// Masked CEP of the current estimate.
    pub cep: String,
    pub shipping_options: Vec<ShippingOptionView>,
    /// Raw CEP digits for the selection form.
    pub cep_digits: String,
    pub finalize_url: String,
    pub error: Option<String>,
}

/// Empty cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/empty.html")]
pub struct CartEmptyTemplate {
    pub breadcrumb: BreadcrumbView,
    pub error: Option<String>,
}

/// Where the "finalize" button leads.
fn finalize_url(logged_in: bool) -> String {
    if logged_in {
        "/frete".to_string()
    } else {
        format!("/login?returnUrl={}", urlencoding::encode("/frete"))
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, shopper))]
pub async fn show(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Query(query): Query<CartQuery>,
) -> Result<Response> {
    let cart = load_cart(&state, &mut shopper).await?;
    let user = load_user(&state, &mut shopper).await?;
    let breadcrumb = BreadcrumbView::new(Step::Cart, user.as_ref());
    let mut error = query.error.as_deref().map(|c| error_message(c).to_string());

    if cart.is_empty() {
        return Ok(CartEmptyTemplate { breadcrumb, error }.into_response());
    }

    let lines = load_cart_lines(state.commerce(), &cart, &state.config().store_name).await?;
    let applied_coupon = state.commerce().checkout_coupon(&shopper.ctx).await?;

    let cep = query.cep.as_deref().and_then(|raw| Cep::parse(raw).ok());
    let mut options = Vec::new();
    if let Some(cep) = &cep {
        let input = ShippingSimulationInput::for_cep(cep.as_str().to_string());
        match simulate_shipping(state.commerce(), &input, &shopper.ctx).await {
            Ok(quotes) => options = shipping_options(&quotes, cart.selected_shipping.as_ref()),
            Err(e) => {
                warn!(error = %e, "Shipping estimate failed");
                error = Some(error_message("shipping").to_string());
            }
        }
    }

    Ok(CartShowTemplate {
        breadcrumb,
        lines: lines.iter().map(LineView::from).collect(),
        summary: SummaryView::from(&cart),
        applied_coupon,
        cep: cep.as_ref().map(Cep::formatted).unwrap_or_default(),
        shipping_options: options,
        cep_digits: cep.map(|c| c.as_str().to_string()).unwrap_or_default(),
        finalize_url: finalize_url(shopper.is_logged_in()),
        error,
    }
    .into_response())
}

/// Change a line's quantity.
#[instrument(skip(state, shopper))]
pub async fn update_quantity(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Path(variant): Path<ProductVariantId>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect> {
    let result = change_quantity(&state, &mut shopper, variant, form.quantity).await;
    redirect_after(result, CART_PATH, "quantity")
}

/// Estimate shipping for a CEP.
///
/// The estimate is carried in the query string so the page can re-run it.
#[instrument(skip(form))]
pub async fn estimate_shipping(Form(form): Form<EstimateForm>) -> Redirect {
    match Cep::parse(&form.cep) {
        Ok(cep) => Redirect::to(&format!("{CART_PATH}?cep={}", cep.as_str())),
        Err(_) => redirect_with_error(CART_PATH, "cep"),
    }
}

/// Select one of the estimated shipping quotes.
#[instrument(skip(state, shopper))]
pub async fn select_shipping(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Form(form): Form<SelectShippingForm>,
) -> Result<Redirect> {
    let back = form
        .cep
        .as_deref()
        .and_then(|raw| Cep::parse(raw).ok())
        .map_or_else(
            || CART_PATH.to_string(),
            |cep| format!("{CART_PATH}?cep={}", cep.as_str()),
        );

    ensure_checkout(&state, &mut shopper).await?;
    let result = state
        .commerce()
        .select_shipping(&form.shipping_quote_id, &shopper.ctx)
        .await
        .map(|_| ())
        .map_err(Into::into);
    redirect_after(result, &back, "shipping")
}

/// Apply a coupon. The cart page never removes one.
#[instrument(skip(state, shopper))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Form(form): Form<CouponForm>,
) -> Result<Redirect> {
    let code = form.coupon.trim();
    if code.is_empty() {
        return Ok(redirect_with_error(CART_PATH, "coupon"));
    }

    ensure_checkout(&state, &mut shopper).await?;
    let result = state
        .commerce()
        .add_coupon(code, &shopper.ctx)
        .await
        .map(|_| ())
        .map_err(Into::into);
    redirect_after(result, CART_PATH, "coupon")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_url_depends_on_login() {
        assert_eq!(finalize_url(true), "/frete");
        assert_eq!(finalize_url(false), "/login?returnUrl=%2Ffrete");
    }

    #[tokio::test]
    async fn test_estimate_shipping_redirects_with_digits() {
        let redirect = estimate_shipping(Form(EstimateForm {
            cep: "01001-000".to_string(),
        }))
        .await
        .into_response();
        assert_eq!(
            redirect.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/carrinho?cep=01001000")
        );

        let invalid = estimate_shipping(Form(EstimateForm {
            cep: "123".to_string(),
        }))
        .await
        .into_response();
        assert_eq!(
            invalid.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/carrinho?error=cep")
        );
    }
}
