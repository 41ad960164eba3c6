//! Shipping ("Frete") route handlers.
//!
//! Requires a logged-in customer. The page lists the customer's addresses,
//! quotes shipping for the selected one and offers gift wrap for lines whose
//! product group supports it.

use std::collections::HashMap;

use abacate_core::{Cep, Phone, ProductVariantId};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::cart::{CouponForm, QuantityForm};
use super::{
    change_quantity, ensure_checkout, error_message, fill_blank, load_cart, load_user,
    redirect_after, redirect_with_error,
};
use crate::commerce::{CommerceError, CreateAddressInput, ShippingSimulationInput};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{AuthRejection, RequireCustomer};
use crate::services::cep::CepError;
use crate::services::checkout::{
    GiftMessage, apply_gift_wrap, load_cart_lines, load_customizations, offers_gift_wrap,
    simulate_shipping,
};
use crate::state::AppState;
use crate::views::{
    AddressView, BRAZILIAN_STATES, BreadcrumbView, GiftLineView, LineView, ShippingOptionView,
    StateOption, Step, SummaryView, shipping_options,
};

const SHIPPING_PATH: &str = "/frete";

// =============================================================================
// Form and Query Types
// =============================================================================

/// Query parameters for error display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// New address form data.
#[derive(Debug, Default, Deserialize)]
pub struct AddressForm {
    pub receiver_name: String,
    pub cep: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub address_number: String,
    #[serde(default)]
    pub address_details: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub phone: String,
}

/// Shipping selection form data.
#[derive(Debug, Deserialize)]
pub struct SelectShippingForm {
    pub shipping_quote_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Shipping page template.
#[derive(Template, WebTemplate)]
#[template(path = "shipping/show.html")]
pub struct ShippingTemplate {
    pub breadcrumb: BreadcrumbView,
    pub addresses: Vec<AddressView>,
    pub shipping_options: Vec<ShippingOptionView>,
    pub has_selected_address: bool,
    /// "Go to payment" is only enabled once a quote is selected.
    pub can_continue: bool,
    pub lines: Vec<LineView>,
    pub gift_lines: Vec<GiftLineView>,
    pub summary: SummaryView,
    pub states: &'static [StateOption],
    pub error: Option<String>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the shipping page.
#[instrument(skip(state, shopper))]
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Query(query): Query<MessageQuery>,
) -> Result<Response> {
    let cart = load_cart(&state, &mut shopper).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/carrinho").into_response());
    }

    let Some(user) = load_user(&state, &mut shopper).await? else {
        return Ok(AuthRejection::RedirectToLogin(SHIPPING_PATH.to_string()).into_response());
    };

    let mut error = query.error.as_deref().map(|c| error_message(c).to_string());
    let addresses = state.commerce().user_addresses(&shopper.ctx).await?;

    let mut quotes = Vec::new();
    if !addresses.is_empty() && cart.selected_address.is_some() {
        let input = ShippingSimulationInput::for_selected_address();
        match simulate_shipping(state.commerce(), &input, &shopper.ctx).await {
            Ok(q) => quotes = q,
            Err(CommerceError::UserError(message)) => {
                warn!(%message, "Shipping simulation rejected");
                error = Some(error_message("shipping").to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let lines = load_cart_lines(state.commerce(), &cart, &state.config().store_name).await?;
    let customizations = load_customizations(state.commerce(), &cart).await;
    let gift_lines = lines
        .iter()
        .filter(|l| offers_gift_wrap(&l.line, &customizations))
        .map(|l| GiftLineView {
            variant_id: l.line.product_variant_id.to_string(),
            name: l.name.clone(),
        })
        .collect();

    Ok(ShippingTemplate {
        breadcrumb: BreadcrumbView::new(Step::Shipping, Some(&user)),
        addresses: addresses
            .iter()
            .map(|a| AddressView::new(a, cart.selected_address.as_ref()))
            .collect(),
        shipping_options: shipping_options(&quotes, cart.selected_shipping.as_ref()),
        has_selected_address: cart.selected_address.is_some(),
        can_continue: cart.selected_shipping.is_some(),
        lines: lines.iter().map(LineView::from).collect(),
        gift_lines,
        summary: SummaryView::from(&cart),
        states: &BRAZILIAN_STATES,
        error,
    }
    .into_response())
}

/// Create an address and select it when the cart has none.
///
/// Blank street, neighborhood, city or state are filled from the CEP lookup.
#[instrument(skip(state, shopper, form))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Form(mut form): Form<AddressForm>,
) -> Result<Redirect> {
    let Ok(cep) = Cep::parse(&form.cep) else {
        return Ok(redirect_with_error(SHIPPING_PATH, "cep"));
    };
    let Ok(phone) = Phone::parse(&form.phone) else {
        return Ok(redirect_with_error(SHIPPING_PATH, "phone"));
    };

    if [&form.street, &form.neighborhood, &form.city, &form.state]
        .iter()
        .any(|v| v.trim().is_empty())
    {
        match state.cep().lookup(cep.as_str()).await {
            Ok(found) => {
                fill_blank(&mut form.street, found.street);
                fill_blank(&mut form.neighborhood, found.neighborhood);
                fill_blank(&mut form.city, Some(found.city));
                fill_blank(&mut form.state, Some(found.state));
            }
            Err(CepError::NotFound(_)) => {
                return Ok(redirect_with_error(SHIPPING_PATH, "cep-not-found"));
            }
            Err(e) => warn!(error = %e, "CEP lookup failed, keeping the form values"),
        }
    }

    let Some(user) = load_user(&state, &mut shopper).await? else {
        return Ok(Redirect::to("/login?returnUrl=%2Ffrete"));
    };
    let cart = load_cart(&state, &mut shopper).await?;

    let input = CreateAddressInput {
        address_details: form.address_details.trim().to_string(),
        address_number: form.address_number.trim().to_string(),
        city: form.city.trim().to_string(),
        cep: cep.as_str().to_string(),
        country: "BR".to_string(),
        email: user.email,
        name: form.receiver_name.trim().to_string(),
        neighborhood: form.neighborhood.trim().to_string(),
        phone: phone.to_string(),
        state: form.state.trim().to_string(),
        street: form.street.trim().to_string(),
    };

    let result = async {
        state.commerce().create_address(&input, &shopper.ctx).await?;

        if cart.selected_address.is_none() {
            let addresses = state.commerce().user_addresses(&shopper.ctx).await?;
            if let Some(newest) = addresses.last() {
                state.commerce().select_address(&newest.id, &shopper.ctx).await?;
                info!(address_id = %newest.id, "Selected the new address");
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    redirect_after(result, SHIPPING_PATH, "address")
}

/// Select one of the customer's addresses.
///
/// The page re-simulates shipping for the selected address when it loads.
#[instrument(skip(state, shopper))]
pub async fn select_address(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Path(address_id): Path<String>,
) -> Result<Redirect> {
    ensure_checkout(&state, &mut shopper).await?;
    let result = state
        .commerce()
        .select_address(&address_id, &shopper.ctx)
        .await
        .map(|_| ())
        .map_err(Into::into);
    redirect_after(result, SHIPPING_PATH, "address")
}

/// Select a shipping quote.
#[instrument(skip(state, shopper))]
pub async fn select_shipping(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Form(form): Form<SelectShippingForm>,
) -> Result<Redirect> {
    ensure_checkout(&state, &mut shopper).await?;
    add_breadcrumb(
        "checkout",
        "Selected shipping",
        Some(&[("quote", form.shipping_quote_id.as_str())]),
    );
    let result = state
        .commerce()
        .select_shipping(&form.shipping_quote_id, &shopper.ctx)
        .await
        .map(|_| ())
        .map_err(Into::into);
    redirect_after(result, SHIPPING_PATH, "shipping")
}

/// Gift-wrap the checked lines.
///
/// Form fields per line: `gift_{variant}` checks the line, `message_{variant}`
/// set to `sim` adds the card built from `from_`, `to_` and `text_`.
#[instrument(skip(state, shopper, form))]
pub async fn gift_wrap(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Redirect> {
    let selections = gift_selections(&form);
    if selections.is_empty() {
        return Ok(Redirect::to(SHIPPING_PATH));
    }

    let cart = load_cart(&state, &mut shopper).await?;
    let result = apply_gift_wrap(state.commerce(), &cart, &selections, &shopper.ctx)
        .await
        .map(|_| ())
        .map_err(Into::into);
    redirect_after(result, SHIPPING_PATH, "gift")
}

/// Parse the gift-wrap form into `(variant, message)` pairs, by variant id.
fn gift_selections(form: &HashMap<String, String>) -> Vec<(ProductVariantId, Option<GiftMessage>)> {
    let field = |name: &str, variant: &str| {
        form.get(&format!("{name}_{variant}"))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let mut selections: Vec<_> = form
        .keys()
        .filter_map(|key| key.strip_prefix("gift_"))
        .filter_map(|variant| {
            let id = variant.parse::<ProductVariantId>().ok()?;
            let wants_message = field("message", variant).eq_ignore_ascii_case("sim");
            let message = wants_message.then(|| GiftMessage {
                from: field("from", variant),
                to: field("to", variant),
                message: field("text", variant),
            });
            Some((id, message))
        })
        .collect();

    selections.sort_by_key(|(id, _)| id.as_i64());
    selections
}

/// Apply the entered coupon, or remove the applied one.
#[instrument(skip(state, shopper))]
pub async fn toggle_coupon(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Form(form): Form<CouponForm>,
) -> Result<Redirect> {
    let result = super::toggle_coupon(&state, &mut shopper, &form.coupon).await;
    redirect_after(result, SHIPPING_PATH, "coupon")
}

/// Change a line's quantity.
#[instrument(skip(state, shopper))]
pub async fn update_quantity(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Path(variant): Path<ProductVariantId>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect> {
    let result = change_quantity(&state, &mut shopper, variant, form.quantity).await;
    redirect_after(result, SHIPPING_PATH, "quantity")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_gift_selections_with_and_without_message() {
        let selections = gift_selections(&form(&[
            ("gift_20", "on"),
            ("gift_10", "on"),
            ("message_10", "sim"),
            ("from_10", " Ana "),
            ("to_10", "Bia"),
            ("text_10", "Feliz aniversário"),
            ("message_30", "sim"),
        ]));

        assert_eq!(selections.len(), 2);
        let (first, message) = &selections[0];
        assert_eq!(first.as_i64(), 10);
        assert_eq!(
            message.as_ref().map(GiftMessage::text).as_deref(),
            Some("De: Ana \nPara: Bia \nFeliz aniversário")
        );

        let (second, message) = &selections[1];
        assert_eq!(second.as_i64(), 20);
        assert!(message.is_none());
    }

    #[test]
    fn test_gift_selections_ignores_bad_ids() {
        assert!(gift_selections(&form(&[("gift_abc", "on")])).is_empty());
    }

    #[test]
    fn test_fill_blank_keeps_typed_values() {
        let mut typed = "Rua A".to_string();
        fill_blank(&mut typed, Some("Rua B".to_string()));
        assert_eq!(typed, "Rua A");

        let mut blank = "  ".to_string();
        fill_blank(&mut blank, Some("Rua B".to_string()));
        assert_eq!(blank, "Rua B");
    }
}
