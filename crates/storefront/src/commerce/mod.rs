//! Commerce platform client.
//!
//! # Architecture
//!
//! - The platform exposes RPC-style loaders and actions at
//!   `POST {COMMERCE_BASE_URL}/live/invoke/{key}` with a JSON props body
//! - The platform is the source of truth: carts, users and orders are never
//!   stored locally, every page load refetches them
//! - The shopper is identified by two headers, `x-checkout-id` (cart) and
//!   `x-customer-token` (logged-in customer), carried in [`ShopperContext`]
//! - Catalog data (product lists, customizations) is cached with `moka`
//!   for 5 minutes; cart, user and payment data are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use abacate_storefront::commerce::{CommerceClient, ShopperContext, UpdateItemInput};
//!
//! let client = CommerceClient::new(&config.commerce)?;
//! let ctx = ShopperContext::anonymous();
//!
//! let cart = client.cart(&ctx).await?;
//! let ctx = ctx.with_checkout_id(cart.checkout_id.clone());
//! client.update_item(&UpdateItemInput::new(variant, 2), &ctx).await?;
//! ```

mod cache;
mod client;
pub mod inputs;
pub mod types;

pub use client::CommerceClient;
pub use inputs::*;
pub use types::*;

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header carrying the shopper's checkout (cart) id.
pub const CHECKOUT_ID_HEADER: &str = "x-checkout-id";

/// Header carrying the logged-in customer's access token.
pub const CUSTOMER_TOKEN_HEADER: &str = "x-customer-token";

/// Errors that can occur when calling the commerce platform.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform did not answer within the configured timeout.
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// The platform answered with a non-success status.
    #[error("{key} returned HTTP {status}")]
    Status { key: String, status: u16 },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The platform rejected the input (e.g., wrong password, invalid coupon).
    #[error("User error: {0}")]
    UserError(String),
}

impl CommerceError {
    /// Message that is safe to show to the shopper, if any.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::UserError(message) => Some(message),
            _ => None,
        }
    }
}

// =============================================================================
// Shopper context
// =============================================================================

/// A customer access token issued by the platform on login or signup.
///
/// Implements `Debug` manually so tokens never reach the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerToken(String);

impl CustomerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `x-customer-token` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CustomerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomerToken([REDACTED])")
    }
}

/// Who the platform should act on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopperContext {
    /// Checkout (cart) id, absent until the platform assigns one.
    pub checkout_id: Option<String>,
    /// Customer token, absent for anonymous shoppers.
    pub customer_token: Option<CustomerToken>,
}

impl ShopperContext {
    /// A shopper with no cart and no login.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_checkout_id(mut self, checkout_id: impl Into<String>) -> Self {
        self.checkout_id = Some(checkout_id.into());
        self
    }

    #[must_use]
    pub fn with_customer_token(mut self, token: CustomerToken) -> Self {
        self.customer_token = Some(token);
        self
    }

    /// Whether a customer is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.customer_token.is_some()
    }
}
