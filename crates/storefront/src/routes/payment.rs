//! Payment ("Pagamento") route handlers.
//!
//! Requires a logged-in customer and a selected shipping quote. Selecting a
//! method or an installment is a platform action followed by a fresh render;
//! finalizing places the order and leads to the confirmation page.

use abacate_core::ProductVariantId;
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
use super::shipping::MessageQuery;
use super::{
    change_quantity, ensure_checkout, error_message, load_cart, load_user, redirect_after,
    redirect_with_error,
};
use crate::commerce::{
    CalculatePricesInput, CommerceError, PaymentKind, PaymentMethod, SelectInstallmentInput,
    UpdateItemInput,
};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{AuthRejection, RequireCustomer};
use crate::models::session_keys;
use crate::services::checkout::{CardForm, CheckoutError, complete_checkout, load_cart_lines};
use crate::state::AppState;
use crate::views::{
    BreadcrumbView, InstallmentView, LineView, PaymentMethodView, Step, SummaryView,
};

const PAYMENT_PATH: &str = "/pagamento";

// =============================================================================
// Form Types
// =============================================================================

/// Payment method form data.
#[derive(Debug, Deserialize)]
pub struct PaymentMethodForm {
    pub payment_method_id: String,
}

/// Installment form data.
#[derive(Debug, Deserialize)]
pub struct InstallmentForm {
    pub installment_number: u32,
}

/// Finalize form data. Card fields are only sent for card payments.
///
/// No `Debug`: the form carries the card number and CVC.
#[derive(Default, Deserialize)]
pub struct FinalizeForm {
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub card_name: String,
    #[serde(default)]
    pub card_month: String,
    #[serde(default)]
    pub card_year: String,
    #[serde(default)]
    pub card_cvc: String,
}

impl From<FinalizeForm> for CardForm {
    fn from(form: FinalizeForm) -> Self {
        Self {
            number: form.card_number,
            name: form.card_name,
            month: form.card_month,
            year: form.card_year,
            cvc: form.card_cvc,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Payment page template.
#[derive(Template, WebTemplate)]
#[template(path = "payment/show.html")]
pub struct PaymentTemplate {
    pub breadcrumb: BreadcrumbView,
    pub methods: Vec<PaymentMethodView>,
    pub has_method: bool,
    pub is_card: bool,
    pub is_pix: bool,
    pub is_boleto: bool,
    pub installments: Vec<InstallmentView>,
    pub lines: Vec<LineView>,
    pub summary: SummaryView,
    pub error: Option<String>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the payment page.
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
    if cart.selected_shipping.is_none() {
        return Ok(Redirect::to("/frete").into_response());
    }

    let Some(user) = load_user(&state, &mut shopper).await? else {
        return Ok(AuthRejection::RedirectToLogin(PAYMENT_PATH.to_string()).into_response());
    };

    let methods = state.commerce().payment_methods(&shopper.ctx).await?;
    let selected = cart.selected_payment_method.as_ref();
    let kind = selected
        .and_then(|s| methods.iter().find(|m| m.id == s.id))
        .map(PaymentMethod::kind);

    let installments = if kind == Some(PaymentKind::Card) {
        let input = CalculatePricesInput {
            products: cart
                .products
                .iter()
                .map(|p| UpdateItemInput::new(p.product_variant_id, p.quantity))
                .collect(),
        };
        let prices = state.commerce().calculate_prices(&input, &shopper.ctx).await?;
        prices
            .card_installments()
            .iter()
            .map(|i| InstallmentView::new(i, selected))
            .collect()
    } else {
        Vec::new()
    };

    let lines = load_cart_lines(state.commerce(), &cart, &state.config().store_name).await?;

    Ok(PaymentTemplate {
        breadcrumb: BreadcrumbView::new(Step::Payment, Some(&user)),
        methods: methods
            .iter()
            .map(|m| PaymentMethodView::new(m, selected))
            .collect(),
        has_method: kind.is_some(),
        is_card: kind == Some(PaymentKind::Card),
        is_pix: kind == Some(PaymentKind::Pix),
        is_boleto: kind == Some(PaymentKind::Boleto),
        installments,
        lines: lines.iter().map(LineView::from).collect(),
        summary: SummaryView::from(&cart),
        error: query.error.as_deref().map(|c| error_message(c).to_string()),
    }
    .into_response())
}

/// Select a payment method.
#[instrument(skip(state, shopper))]
pub async fn select_method(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Form(form): Form<PaymentMethodForm>,
) -> Result<Redirect> {
    ensure_checkout(&state, &mut shopper).await?;
    add_breadcrumb(
        "checkout",
        "Selected payment method",
        Some(&[("method", form.payment_method_id.as_str())]),
    );
    let result = state
        .commerce()
        .select_payment(&form.payment_method_id, &shopper.ctx)
        .await
        .map(|_| ())
        .map_err(Into::into);
    redirect_after(result, PAYMENT_PATH, "payment-method")
}

/// Select the number of installments for the selected card method.
#[instrument(skip(state, shopper))]
pub async fn select_installment(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Form(form): Form<InstallmentForm>,
) -> Result<Redirect> {
    let cart = load_cart(&state, &mut shopper).await?;
    let Some(method) = cart.selected_payment_method else {
        return Ok(redirect_with_error(PAYMENT_PATH, "payment-method"));
    };

    let input = SelectInstallmentInput {
        installment_number: form.installment_number,
        selected_payment_method_id: method.id,
    };
    let result = state
        .commerce()
        .select_installment(&input, &shopper.ctx)
        .await
        .map(|_| ())
        .map_err(Into::into);
    redirect_after(result, PAYMENT_PATH, "installment")
}

/// Apply the entered coupon, or remove the applied one.
#[instrument(skip(state, shopper))]
pub async fn toggle_coupon(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Form(form): Form<CouponForm>,
) -> Result<Redirect> {
    let result = super::toggle_coupon(&state, &mut shopper, &form.coupon).await;
    redirect_after(result, PAYMENT_PATH, "coupon")
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
    redirect_after(result, PAYMENT_PATH, "quantity")
}

/// Place the order.
///
/// On success the session forgets the checkout id, so the next visit to the
/// cart opens a new one.
#[instrument(skip(state, shopper, form))]
pub async fn finalize(
    State(state): State<AppState>,
    RequireCustomer(mut shopper): RequireCustomer,
    Form(form): Form<FinalizeForm>,
) -> Result<Redirect> {
    let cart = load_cart(&state, &mut shopper).await?;
    if cart.selected_shipping.is_none() {
        return Ok(Redirect::to("/frete"));
    }

    let Some(user) = load_user(&state, &mut shopper).await? else {
        return Ok(Redirect::to("/login?returnUrl=%2Fpagamento"));
    };

    let card = CardForm::from(form);
    add_breadcrumb("checkout", "Finalizing order", None);
    match complete_checkout(state.commerce(), &card, &user, &shopper.ctx).await {
        Ok(checkout_id) => {
            shopper
                .session
                .remove::<String>(session_keys::CHECKOUT_ID)
                .await?;
            info!(checkout_id = %checkout_id, "Order placed");
            Ok(Redirect::to(&format!(
                "/confirmacao?id={}",
                urlencoding::encode(&checkout_id)
            )))
        }
        Err(CheckoutError::Commerce(e)) if !matches!(e, CommerceError::UserError(_)) => {
            Err(e.into())
        }
        Err(e) => {
            warn!(error = %e, "Checkout rejected");
            Ok(redirect_with_error(PAYMENT_PATH, checkout_error_code(&e)))
        }
    }
}

/// Error code shown on the payment page for a rejected checkout.
const fn checkout_error_code(err: &CheckoutError) -> &'static str {
    match err {
        CheckoutError::NoPaymentMethod | CheckoutError::UnsupportedPaymentMethod(_) => {
            "payment-method"
        }
        CheckoutError::CardExpiry(_) | CheckoutError::MissingCardField(_) => "card",
        CheckoutError::Cpf(_) => "cpf",
        CheckoutError::Commerce(_) => "checkout",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abacate_core::{CardExpiryError, DocumentError, DocumentKind};

    #[test]
    fn test_checkout_error_codes() {
        assert_eq!(
            checkout_error_code(&CheckoutError::NoPaymentMethod),
            "payment-method"
        );
        assert_eq!(
            checkout_error_code(&CheckoutError::MissingCardField("cvc")),
            "card"
        );
        assert_eq!(
            checkout_error_code(&CheckoutError::Cpf(DocumentError::InvalidChecksum(
                DocumentKind::Cpf
            ))),
            "cpf"
        );
        assert_eq!(
            checkout_error_code(&CheckoutError::Commerce(CommerceError::UserError(
                "Cartão recusado".to_string()
            ))),
            "checkout"
        );
        assert_eq!(
            checkout_error_code(&CheckoutError::CardExpiry(CardExpiryError::InvalidMonth(
                "13".to_string()
            ))),
            "card"
        );
    }

    #[test]
    fn test_finalize_form_maps_to_card_form() {
        let card = CardForm::from(FinalizeForm {
            card_number: "4111 1111 1111 1111".to_string(),
            card_name: "ANA SOUZA".to_string(),
            card_month: "7".to_string(),
            card_year: "2030".to_string(),
            card_cvc: "123".to_string(),
        });
        assert_eq!(card.month, "7");
        assert_eq!(card.name, "ANA SOUZA");
        assert!(!format!("{card:?}").contains("4111"));
    }
}
