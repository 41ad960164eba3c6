//! JSON API route handlers.
//!
//! Small endpoints for client-side enhancements: address autofill by CEP and
//! the cart badge in the site header.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use super::load_cart;
use crate::error::Result;
use crate::middleware::Shopper;
use crate::services::cep::CepAddress;
use crate::state::AppState;

/// Cart badge payload.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub quantity: u32,
}

/// Look up the address of a CEP.
///
/// Invalid CEPs are a 400 and unknown ones a 404.
#[instrument(skip(state))]
pub async fn cep_lookup(
    State(state): State<AppState>,
    Path(cep): Path<String>,
) -> Result<Json<CepAddress>> {
    let address = state.cep().lookup(&cep).await?;
    Ok(Json(address))
}

/// Number of units in the shopper's cart.
#[instrument(skip(state, shopper))]
pub async fn cart_count(
    State(state): State<AppState>,
    mut shopper: Shopper,
) -> Result<Json<CartCount>> {
    let cart = load_cart(&state, &mut shopper).await?;
    Ok(Json(CartCount {
        quantity: cart.item_count(),
    }))
}
