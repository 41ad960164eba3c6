//! Invoke client for the commerce platform.

use std::sync::Arc;
use std::time::Duration;

use abacate_core::ProductId;
use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::cache::{CacheKey, CacheValue};
use super::inputs::{
    AddItemInput, CalculatePricesInput, CartProps, CompleteCheckoutInput, CouponInput,
    CreateAddressInput, LoginInput, ProductCustomizationsProps, ProductListProps,
    SelectAddressInput, SelectInstallmentInput, SelectPaymentInput, SelectShippingInput,
    ShippingSimulationInput, SignupCompanyInput, SignupPersonInput, SocialLoginGoogleInput,
    UpdateItemInput,
};
use super::types::{
    Address, Cart, CustomerAccessToken, PaymentMethod, PaymentPrices, Product,
    ProductCustomizations, ShippingQuote, User,
};
use super::{CHECKOUT_ID_HEADER, CUSTOMER_TOKEN_HEADER, CommerceError, ShopperContext};
use crate::config::CommerceConfig;

/// Empty props object for loaders and actions that take none.
#[derive(Serialize)]
struct NoProps {}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

/// Read a `productCustomizations` reply, treating anything unusable as none.
fn parse_customizations(reply: serde_json::Value) -> Option<ProductCustomizations> {
    if reply.is_null() {
        return None;
    }
    match serde_json::from_value(reply) {
        Ok(customizations) => Some(customizations),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable product customizations");
            None
        }
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(500).collect()
}

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the commerce platform's loaders and actions.
///
/// Cheap to clone. Catalog responses are cached for 5 minutes.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CommerceClient {
    /// Create a new commerce client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.expose_secret().to_string(),
                cache,
            }),
        })
    }

    /// Invoke a loader or action by key.
    async fn invoke<P, T>(
        &self,
        key: &str,
        props: &P,
        ctx: &ShopperContext,
    ) -> Result<T, CommerceError>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/live/invoke/{key}", self.inner.base_url);

        let mut request = self
            .inner
            .client
            .post(&url)
            .bearer_auth(&self.inner.api_token)
            .json(props);

        if let Some(checkout_id) = &ctx.checkout_id {
            request = request.header(CHECKOUT_ID_HEADER, checkout_id);
        }
        if let Some(token) = &ctx.customer_token {
            request = request.header(CUSTOMER_TOKEN_HEADER, token.expose());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CommerceError::Timeout(key.to_string())
            } else {
                CommerceError::Http(e)
            }
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(key.to_string()));
        }

        let response_text = response.text().await?;

        if status.is_client_error()
            && let Ok(ErrorBody { message }) = serde_json::from_str(&response_text)
        {
            debug!(key, status = %status, message = %message, "Commerce platform rejected input");
            return Err(CommerceError::UserError(message));
        }

        if !status.is_success() {
            tracing::error!(
                key,
                status = %status,
                body = %truncate(&response_text),
                "Commerce platform returned non-success status"
            );
            return Err(CommerceError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                key,
                error = %e,
                body = %truncate(&response_text),
                "Failed to parse commerce platform response"
            );
            CommerceError::Parse(e)
        })
    }

    // =========================================================================
    // Cart Loaders
    // =========================================================================

    /// Load the shopper's cart. Without a checkout id the platform opens a
    /// new one; callers should remember the returned `checkout_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn cart(&self, ctx: &ShopperContext) -> Result<Cart, CommerceError> {
        self.invoke("cart", &CartProps::default(), ctx).await
    }

    /// Load a cart by its checkout id (used by the confirmation page).
    ///
    /// # Errors
    ///
    /// Returns an error if the cart does not exist or the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn cart_by_id(
        &self,
        checkout_id: &str,
        ctx: &ShopperContext,
    ) -> Result<Cart, CommerceError> {
        let props = CartProps {
            cart_id: Some(checkout_id.to_string()),
        };
        self.invoke("cart", &props, ctx).await
    }

    /// The coupon applied to the checkout, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn checkout_coupon(
        &self,
        ctx: &ShopperContext,
    ) -> Result<Option<String>, CommerceError> {
        let coupon: Option<String> = self.invoke("checkoutCoupon", &NoProps {}, ctx).await?;
        Ok(coupon.filter(|c| !c.is_empty()))
    }

    // =========================================================================
    // Catalog Loaders
    // =========================================================================

    /// Catalog products for the given SKUs.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(count = skus.len()))]
    pub async fn product_list(&self, skus: &[String]) -> Result<Vec<Product>, CommerceError> {
        if skus.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = CacheKey::product_list(skus);

        if let Some(CacheValue::ProductList(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let props = ProductListProps::by_skus(skus.to_vec());
        let products: Option<Vec<Option<Product>>> = self
            .invoke("productList", &props, &ShopperContext::anonymous())
            .await?;
        let products: Vec<Product> = products.unwrap_or_default().into_iter().flatten().collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::ProductList(products.clone()))
            .await;

        Ok(products)
    }

    /// Customization slots of a product group, or `None` when it has none.
    ///
    /// A `null` reply, or one without a customization variant, means the
    /// group cannot be customized.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_customizations(
        &self,
        product_id: ProductId,
    ) -> Result<Option<ProductCustomizations>, CommerceError> {
        let cache_key = CacheKey::Customizations(product_id);

        if let Some(CacheValue::Customizations(customizations)) =
            self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for product customizations");
            return Ok(customizations.map(|c| *c));
        }

        let props = ProductCustomizationsProps { product_id };
        let reply: serde_json::Value = self
            .invoke("productCustomizations", &props, &ShopperContext::anonymous())
            .await?;
        let customizations = parse_customizations(reply);

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Customizations(customizations.clone().map(Box::new)),
            )
            .await;

        Ok(customizations)
    }

    // =========================================================================
    // Cart Actions
    // =========================================================================

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn update_item(
        &self,
        input: &UpdateItemInput,
        ctx: &ShopperContext,
    ) -> Result<Cart, CommerceError> {
        self.invoke("updateItem", input, ctx).await
    }

    /// Add a line, optionally with customization values.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn add_item(
        &self,
        input: &AddItemInput,
        ctx: &ShopperContext,
    ) -> Result<Cart, CommerceError> {
        self.invoke("addItem", input, ctx).await
    }

    /// Apply a coupon code.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserError` if the coupon is rejected.
    #[instrument(skip(self, ctx))]
    pub async fn add_coupon(&self, coupon: &str, ctx: &ShopperContext) -> Result<Cart, CommerceError> {
        let input = CouponInput {
            coupon: coupon.to_string(),
        };
        self.invoke("addCoupon", &input, ctx).await
    }

    /// Remove a coupon code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn remove_coupon(
        &self,
        coupon: &str,
        ctx: &ShopperContext,
    ) -> Result<Cart, CommerceError> {
        let input = CouponInput {
            coupon: coupon.to_string(),
        };
        self.invoke("removeCoupon", &input, ctx).await
    }

    // =========================================================================
    // Shipping
    // =========================================================================

    /// Quote shipping for the cart's items.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn shipping_simulation(
        &self,
        input: &ShippingSimulationInput,
        ctx: &ShopperContext,
    ) -> Result<Vec<ShippingQuote>, CommerceError> {
        let quotes: Option<Vec<Option<ShippingQuote>>> =
            self.invoke("shippingSimulation", input, ctx).await?;
        Ok(quotes.unwrap_or_default().into_iter().flatten().collect())
    }

    /// Select a shipping quote for the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn select_shipping(
        &self,
        shipping_quote_id: &str,
        ctx: &ShopperContext,
    ) -> Result<Cart, CommerceError> {
        let input = SelectShippingInput {
            shipping_quote_id: shipping_quote_id.to_string(),
        };
        self.invoke("selectShipping", &input, ctx).await
    }

    /// Addresses of the logged-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn user_addresses(&self, ctx: &ShopperContext) -> Result<Vec<Address>, CommerceError> {
        let addresses: Option<Vec<Option<Address>>> =
            self.invoke("userAddresses", &NoProps {}, ctx).await?;
        Ok(addresses.unwrap_or_default().into_iter().flatten().collect())
    }

    /// Select a delivery address for the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn select_address(
        &self,
        address_id: &str,
        ctx: &ShopperContext,
    ) -> Result<Cart, CommerceError> {
        let input = SelectAddressInput {
            address_id: address_id.to_string(),
        };
        self.invoke("selectAddress", &input, ctx).await
    }

    /// Create an address for the logged-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, input, ctx))]
    pub async fn create_address(
        &self,
        input: &CreateAddressInput,
        ctx: &ShopperContext,
    ) -> Result<(), CommerceError> {
        let _: serde_json::Value = self.invoke("createAddress", input, ctx).await?;
        Ok(())
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Payment methods available for the checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn payment_methods(
        &self,
        ctx: &ShopperContext,
    ) -> Result<Vec<PaymentMethod>, CommerceError> {
        let methods: Option<Vec<Option<PaymentMethod>>> =
            self.invoke("paymentMethods", &NoProps {}, ctx).await?;
        Ok(methods.unwrap_or_default().into_iter().flatten().collect())
    }

    /// Installment plans for the given lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn calculate_prices(
        &self,
        input: &CalculatePricesInput,
        ctx: &ShopperContext,
    ) -> Result<PaymentPrices, CommerceError> {
        let prices: Option<PaymentPrices> = self.invoke("calculatePrices", input, ctx).await?;
        Ok(prices.unwrap_or_default())
    }

    /// Select the payment method for the checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn select_payment(
        &self,
        payment_method_id: &str,
        ctx: &ShopperContext,
    ) -> Result<Cart, CommerceError> {
        let input = SelectPaymentInput {
            payment_method_id: payment_method_id.to_string(),
        };
        self.invoke("selectPayment", &input, ctx).await
    }

    /// Select the number of installments.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn select_installment(
        &self,
        input: &SelectInstallmentInput,
        ctx: &ShopperContext,
    ) -> Result<Cart, CommerceError> {
        self.invoke("selectInstallment", input, ctx).await
    }

    /// Place the order.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserError` if the payment is refused.
    #[instrument(skip(self, input, ctx))]
    pub async fn complete_checkout(
        &self,
        input: &CompleteCheckoutInput,
        ctx: &ShopperContext,
    ) -> Result<(), CommerceError> {
        let _: serde_json::Value = self.invoke("completeCheckout", input, ctx).await?;
        Ok(())
    }

    /// Attach the checkout to the logged-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn associate_checkout(&self, ctx: &ShopperContext) -> Result<(), CommerceError> {
        let _: serde_json::Value = self.invoke("associateCheckout", &NoProps {}, ctx).await?;
        Ok(())
    }

    // =========================================================================
    // Customer
    // =========================================================================

    /// The logged-in customer. Anonymous shoppers get `None` without a call.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn user(&self, ctx: &ShopperContext) -> Result<Option<User>, CommerceError> {
        if !ctx.is_logged_in() {
            return Ok(None);
        }
        self.invoke("user", &NoProps {}, ctx).await
    }

    /// Log in with email or document and password.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserError` on wrong credentials.
    #[instrument(skip(self, input, ctx))]
    pub async fn login(
        &self,
        input: &LoginInput,
        ctx: &ShopperContext,
    ) -> Result<CustomerAccessToken, CommerceError> {
        self.invoke("login", input, ctx).await
    }

    /// Invalidate the customer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn logout(&self, ctx: &ShopperContext) -> Result<(), CommerceError> {
        let _: serde_json::Value = self.invoke("logout", &NoProps {}, ctx).await?;
        Ok(())
    }

    /// Create a person account. `partial` skips password and address.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserError` if the platform rejects the data.
    #[instrument(skip(self, input, ctx))]
    pub async fn signup_person(
        &self,
        input: &SignupPersonInput,
        partial: bool,
        ctx: &ShopperContext,
    ) -> Result<CustomerAccessToken, CommerceError> {
        let key = if partial { "signupPartialPerson" } else { "signupPerson" };
        self.invoke(key, input, ctx).await
    }

    /// Create a company account. `partial` skips password and address.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserError` if the platform rejects the data.
    #[instrument(skip(self, input, ctx))]
    pub async fn signup_company(
        &self,
        input: &SignupCompanyInput,
        partial: bool,
        ctx: &ShopperContext,
    ) -> Result<CustomerAccessToken, CommerceError> {
        let key = if partial { "signupPartialCompany" } else { "signupCompany" };
        self.invoke(key, input, ctx).await
    }

    /// Exchange a Google authorization code for a customer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    #[instrument(skip(self, input, ctx))]
    pub async fn social_login_google(
        &self,
        input: &SocialLoginGoogleInput,
        ctx: &ShopperContext,
    ) -> Result<CustomerAccessToken, CommerceError> {
        self.invoke("socialLoginGoogle", input, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_limits_body() {
        let body = "x".repeat(2000);
        assert_eq!(truncate(&body).len(), 500);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_customizations_reply_without_variant_is_none() {
        assert!(parse_customizations(serde_json::Value::Null).is_none());
        assert!(
            parse_customizations(serde_json::json!({
                "productVariantId": null,
                "customizations": [{ "customizationId": 1, "name": "isGift" }]
            }))
            .is_none()
        );

        let parsed = parse_customizations(serde_json::json!({
            "productVariantId": 900,
            "customizations": null
        }));
        assert!(parsed.is_some_and(|c| c.customizations.is_empty()));
    }

    #[test]
    fn test_no_props_serializes_to_empty_object() {
        assert_eq!(serde_json::to_string(&NoProps {}).ok().as_deref(), Some("{}"));
    }
}
