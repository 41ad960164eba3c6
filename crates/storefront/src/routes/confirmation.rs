//! Order confirmation route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use super::load_user;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::Shopper;
use crate::services::checkout::load_cart_lines;
use crate::state::AppState;
use crate::views::{AddressView, OrderLineView, OrderView};

/// Query parameters of the confirmation page.
#[derive(Debug, Deserialize)]
pub struct ConfirmationQuery {
    /// Checkout id of the completed cart.
    pub id: String,
}

/// Confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "confirmation/show.html")]
pub struct ConfirmationTemplate {
    /// Upper-cased store name for the heading.
    pub store_name: String,
    pub order: OrderView,
    pub email: Option<String>,
    pub address: Option<AddressView>,
    pub lines: Vec<OrderLineView>,
}

/// Display the summary of the last order placed with a checkout.
#[instrument(skip(state, shopper))]
pub async fn show(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Query(query): Query<ConfirmationQuery>,
) -> Result<ConfirmationTemplate> {
    let cart = state.commerce().cart_by_id(&query.id, &shopper.ctx).await?;
    let order = cart
        .last_order()
        .ok_or_else(|| AppError::NotFound(format!("order for checkout {}", query.id)))?;

    let user = load_user(&state, &mut shopper).await?;
    let lines = load_cart_lines(state.commerce(), &cart, &state.config().store_name).await?;

    Ok(ConfirmationTemplate {
        store_name: state.config().store_name.to_uppercase(),
        order: OrderView::from(order),
        email: user.map(|u| u.email),
        address: cart
            .selected_address
            .as_ref()
            .map(|a| AddressView::new(a, None)),
        lines: lines.iter().map(OrderLineView::from).collect(),
    })
}
