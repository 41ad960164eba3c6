//! Checkout workflows shared by the cart, shipping and payment pages.
//!
//! Pure helpers (shipping descriptions, totals, gift-wrap plans, payment
//! payloads) live next to the async workflows that chain commerce calls.

use std::collections::{HashMap, HashSet};

use abacate_core::{
    CardExpiry, CardExpiryError, Cpf, DocumentError, Price, ProductId, ProductVariantId, digits,
};
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::commerce::{
    AddItemInput, Cart, CartProduct, CommerceClient, CommerceError, CompleteCheckoutInput,
    CustomizationInput, GIFT_YES, PaymentData, PaymentKind, Product, ProductCustomizations,
    ShippingQuote, ShippingSimulationInput, ShopperContext, UpdateItemInput, User,
};

/// Errors from checkout workflows.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// Finalizing without a selected payment method.
    #[error("no payment method selected")]
    NoPaymentMethod,

    /// The selected payment method is not one of card, pix or boleto.
    #[error("unsupported payment method: {0}")]
    UnsupportedPaymentMethod(String),

    #[error("invalid card expiry: {0}")]
    CardExpiry(#[from] CardExpiryError),

    #[error("invalid CPF: {0}")]
    Cpf(#[from] DocumentError),

    /// Card data is incomplete.
    #[error("missing card field: {0}")]
    MissingCardField(&'static str),
}

impl CheckoutError {
    /// Portuguese message for the payment page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Commerce(e) => e
                .user_message()
                .map_or_else(|| "Não foi possível finalizar a compra.".to_string(), str::to_string),
            Self::NoPaymentMethod => "Selecione uma forma de pagamento.".to_string(),
            Self::UnsupportedPaymentMethod(_) => "Forma de pagamento indisponível.".to_string(),
            Self::CardExpiry(_) => "Validade do cartão inválida.".to_string(),
            Self::Cpf(_) => "CPF inválido.".to_string(),
            Self::MissingCardField(_) => "Preencha todos os dados do cartão.".to_string(),
        }
    }
}

// =============================================================================
// Cart lines
// =============================================================================

/// A cart line enriched with catalog data, ready for display.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub line: CartProduct,
    pub seller: String,
    pub name: String,
    pub image_url: Option<String>,
    pub properties: Vec<(String, String)>,
    pub list_price: Price,
}

impl CartLine {
    /// Whether the list price is above the sale price.
    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.list_price > self.line.price
    }

    /// The higher of list and sale price (struck through when discounted).
    #[must_use]
    pub fn display_price(&self) -> Price {
        self.list_price.max(self.line.price)
    }
}

/// Join cart lines with catalog products, in cart order.
///
/// Catalog products whose SKU is not in the cart are ignored. Lines without a
/// catalog match keep the cart's own name and image.
#[must_use]
pub fn full_products(cart: &Cart, catalog: &[Product], default_seller: &str) -> Vec<CartLine> {
    let skus = cart.skus();

    cart.products
        .iter()
        .map(|line| {
            let product = catalog.iter().find(|p| {
                skus.contains(&p.sku) && p.variant_id() == Some(line.product_variant_id)
            });

            let properties = product
                .map(|p| {
                    p.additional_property
                        .iter()
                        .map(|prop| (prop.name.clone(), prop.value.clone().unwrap_or_default()))
                        .collect()
                })
                .unwrap_or_default();

            CartLine {
                seller: product
                    .and_then(Product::seller)
                    .unwrap_or(default_seller)
                    .to_string(),
                name: product
                    .and_then(|p| p.name.clone())
                    .or_else(|| line.name.clone())
                    .unwrap_or_default(),
                image_url: product
                    .and_then(Product::image_url)
                    .map(str::to_string)
                    .or_else(|| line.image_url.clone()),
                properties,
                list_price: product
                    .and_then(Product::list_price)
                    .unwrap_or(line.list_price),
                line: line.clone(),
            }
        })
        .collect()
}

/// Fetch catalog data for the cart and join it with the lines.
///
/// # Errors
///
/// Returns an error if the product list cannot be loaded.
#[instrument(skip(client, cart), fields(checkout_id = %cart.checkout_id))]
pub async fn load_cart_lines(
    client: &CommerceClient,
    cart: &Cart,
    default_seller: &str,
) -> Result<Vec<CartLine>, CommerceError> {
    let catalog = client.product_list(&cart.skus()).await?;
    Ok(full_products(cart, &catalog, default_seller))
}

// =============================================================================
// Shipping
// =============================================================================

/// Sort quotes by price, cheapest first.
pub fn sort_shipping(quotes: &mut [ShippingQuote]) {
    quotes.sort_by_key(|q| q.value);
}

/// "R$ 15,00 - PAC - Até 5 dias úteis para a entrega".
#[must_use]
pub fn shipping_description(quote: &ShippingQuote) -> String {
    let price = if quote.is_free() {
        "Grátis".to_string()
    } else {
        quote.value.format()
    };

    let deadline = match (quote.is_pickup(), quote.deadline) {
        (true, 0) => "Poderá ser retirado hoje".to_string(),
        (true, n) => format!("Poderá ser retirado em {n} dias úteis"),
        (false, 0) => "Será entrege hoje".to_string(),
        (false, n) => format!("Até {n} dias úteis para a entrega"),
    };

    format!("{price} - {} - {deadline}", quote.name)
}

/// Simulate shipping and sort the result.
///
/// # Errors
///
/// Returns an error if the simulation fails.
pub async fn simulate_shipping(
    client: &CommerceClient,
    input: &ShippingSimulationInput,
    ctx: &ShopperContext,
) -> Result<Vec<ShippingQuote>, CommerceError> {
    let mut quotes = client.shipping_simulation(input, ctx).await?;
    sort_shipping(&mut quotes);
    Ok(quotes)
}

/// Subtotal, shipping and total as shown in every summary box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Price,
    pub shipping: Option<Price>,
}

impl Totals {
    #[must_use]
    pub fn for_cart(cart: &Cart) -> Self {
        Self {
            subtotal: cart.subtotal,
            shipping: cart.selected_shipping.as_ref().map(|q| q.value),
        }
    }

    /// Subtotal plus shipping.
    #[must_use]
    pub fn total(&self) -> Price {
        self.subtotal + self.shipping.unwrap_or(Price::ZERO)
    }

    /// Shipping price, or `FRETE GRÁTIS` when absent or zero.
    #[must_use]
    pub fn shipping_label(&self) -> String {
        match self.shipping {
            Some(price) if !price.is_zero() => price.format(),
            _ => "FRETE GRÁTIS".to_string(),
        }
    }
}

// =============================================================================
// Gift wrap
// =============================================================================

/// Card written on a gift-wrapped line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiftMessage {
    pub from: String,
    pub to: String,
    pub message: String,
}

impl GiftMessage {
    /// Value of the `text` customization slot.
    #[must_use]
    pub fn text(&self) -> String {
        format!("De: {} \nPara: {} \n{}", self.from, self.to, self.message)
    }
}

/// Customization slots for each product group in the cart, fetched concurrently.
///
/// Groups without customizations are left out. A failed lookup only costs
/// that group its gift wrap, so it is logged and skipped.
#[instrument(skip(client, cart), fields(lines = cart.products.len()))]
pub async fn load_customizations(
    client: &CommerceClient,
    cart: &Cart,
) -> HashMap<ProductId, ProductCustomizations> {
    let mut seen = HashSet::new();
    let product_ids: Vec<ProductId> = cart
        .products
        .iter()
        .map(|p| p.product_id)
        .filter(|id| seen.insert(*id))
        .collect();

    let results = join_all(product_ids.into_iter().map(|product_id| async move {
        match client.product_customizations(product_id).await {
            Ok(customizations) => customizations.map(|c| (product_id, c)),
            Err(CommerceError::NotFound(_)) => None,
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Gift wrap unavailable for product");
                None
            }
        }
    }))
    .await;

    results.into_iter().flatten().collect()
}

/// Whether a line can be gift-wrapped.
#[must_use]
pub fn offers_gift_wrap(
    line: &CartProduct,
    customizations: &HashMap<ProductId, ProductCustomizations>,
) -> bool {
    !line.is_gift()
        && customizations
            .get(&line.product_id)
            .is_some_and(|c| c.gift_slots().is_some())
}

/// Replace a line with its gift-wrapped customization variant.
///
/// Returns `None` when the line is already wrapped or the product group
/// lacks the gift slots.
#[must_use]
pub fn gift_wrap_plan(
    line: &CartProduct,
    customizations: &ProductCustomizations,
    message: Option<&GiftMessage>,
) -> Option<(UpdateItemInput, AddItemInput)> {
    if line.is_gift() {
        return None;
    }
    let (gift, text) = customizations.gift_slots()?;

    let mut values = vec![CustomizationInput {
        customization_id: gift.customization_id,
        value: GIFT_YES.to_string(),
    }];
    if let Some(message) = message {
        values.push(CustomizationInput {
            customization_id: text.customization_id,
            value: message.text(),
        });
    }

    Some((
        UpdateItemInput::remove(line.product_variant_id),
        AddItemInput {
            product_variant_id: customizations.product_variant_id,
            quantity: line.quantity,
            customization: values,
        },
    ))
}

/// Gift-wrap the selected lines, one after the other.
///
/// # Errors
///
/// Returns an error if any remote call fails; lines already processed stay
/// wrapped.
#[instrument(skip_all, fields(lines = selections.len()))]
pub async fn apply_gift_wrap(
    client: &CommerceClient,
    cart: &Cart,
    selections: &[(ProductVariantId, Option<GiftMessage>)],
    ctx: &ShopperContext,
) -> Result<usize, CommerceError> {
    let customizations = load_customizations(client, cart).await;
    let mut wrapped = 0;

    for (variant_id, message) in selections {
        let Some(line) = cart
            .products
            .iter()
            .find(|p| p.product_variant_id == *variant_id)
        else {
            warn!(variant_id = %variant_id, "Gift wrap requested for a line not in the cart");
            continue;
        };

        let Some((remove, add)) = customizations
            .get(&line.product_id)
            .and_then(|c| gift_wrap_plan(line, c, message.as_ref()))
        else {
            warn!(variant_id = %variant_id, "Line cannot be gift-wrapped");
            continue;
        };

        client.update_item(&remove, ctx).await?;
        client.add_item(&add, ctx).await?;
        wrapped += 1;
    }

    info!(wrapped, "Gift wrap applied");
    Ok(wrapped)
}

// =============================================================================
// Payment
// =============================================================================

/// Card form fields as submitted.
#[derive(Clone, Default)]
pub struct CardForm {
    pub number: String,
    pub name: String,
    pub month: String,
    pub year: String,
    pub cvc: String,
}

impl core::fmt::Debug for CardForm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CardForm")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Build the gateway payload for a payment kind.
///
/// # Errors
///
/// Returns an error if card data is incomplete or the customer's CPF is
/// invalid.
pub fn payment_data(
    kind: PaymentKind,
    card: &CardForm,
    user: &User,
) -> Result<Option<PaymentData>, CheckoutError> {
    match kind {
        PaymentKind::Pix => Ok(None),
        PaymentKind::Boleto => Ok(Some(PaymentData::Boleto {
            cpf: customer_cpf(user)?,
            telefone: user.phone_number.clone().unwrap_or_default(),
        })),
        PaymentKind::Card => {
            let number = digits(&card.number);
            if number.is_empty() {
                return Err(CheckoutError::MissingCardField("number"));
            }
            if card.name.trim().is_empty() {
                return Err(CheckoutError::MissingCardField("name"));
            }
            let cvc = digits(&card.cvc);
            if cvc.is_empty() {
                return Err(CheckoutError::MissingCardField("cvc"));
            }
            let expiry = CardExpiry::parse(&card.month, &card.year)?;

            Ok(Some(PaymentData::Card {
                number,
                name: card.name.trim().to_string(),
                month: format!("{:02}", expiry.month()),
                year: expiry.year().to_string(),
                cvc,
                expiry: expiry.to_string(),
                cpf: customer_cpf(user)?,
            }))
        }
        PaymentKind::Other => Err(CheckoutError::UnsupportedPaymentMethod(
            kind.comment_label().to_string(),
        )),
    }
}

fn customer_cpf(user: &User) -> Result<String, CheckoutError> {
    let cpf = Cpf::parse(user.cpf.as_deref().unwrap_or_default())?;
    Ok(cpf.as_str().to_string())
}

/// Order comment, e.g. `Comentário Pix 1715350000000`.
#[must_use]
pub fn completion_comment(kind: PaymentKind, epoch_millis: i64) -> String {
    format!("Comentário {} {epoch_millis}", kind.comment_label())
}

/// Kind of the cart's selected payment method.
///
/// # Errors
///
/// Returns an error if no method is selected or the method list cannot be
/// loaded.
pub async fn selected_payment_kind(
    client: &CommerceClient,
    cart: &Cart,
    ctx: &ShopperContext,
) -> Result<PaymentKind, CheckoutError> {
    let selected = cart
        .selected_payment_method
        .as_ref()
        .ok_or(CheckoutError::NoPaymentMethod)?;

    let methods = client.payment_methods(ctx).await?;
    Ok(methods
        .iter()
        .find(|m| m.id == selected.id)
        .map_or(PaymentKind::Other, |m| m.kind()))
}

/// Place the order and attach it to the customer.
///
/// Returns the checkout id for the confirmation page. Once the platform
/// accepts the order, the follow-up calls only log their failures.
///
/// # Errors
///
/// Returns an error if no payment method is selected, the payment data is
/// invalid, or a remote call fails before the order is placed.
#[instrument(skip(client, card, user, ctx))]
pub async fn complete_checkout(
    client: &CommerceClient,
    card: &CardForm,
    user: &User,
    ctx: &ShopperContext,
) -> Result<String, CheckoutError> {
    let cart = client.cart(ctx).await?;
    let kind = selected_payment_kind(client, &cart, ctx).await?;

    let input = CompleteCheckoutInput {
        payment_data: payment_data(kind, card, user)?,
        comments: completion_comment(kind, chrono::Utc::now().timestamp_millis()),
    };

    client.complete_checkout(&input, ctx).await?;
    let checkout_id = cart.checkout_id;
    info!(checkout_id = %checkout_id, kind = kind.comment_label(), "Checkout completed");

    if let Err(e) = client.cart(ctx).await {
        warn!(checkout_id = %checkout_id, error = %e, "Failed to refetch the completed cart");
    }
    if let Err(e) = client.associate_checkout(ctx).await {
        warn!(checkout_id = %checkout_id, error = %e, "Failed to attach the order to the customer");
    }

    Ok(checkout_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commerce::{Customization, CustomizationValue, LineCustomization};
    use serde_json::json;

    fn quote(value: i64, deadline: u32, kind: &str) -> ShippingQuote {
        ShippingQuote {
            shipping_quote_id: format!("q{value}"),
            name: "PAC".to_string(),
            value: Price::from_cents(value),
            deadline,
            kind: kind.to_string(),
        }
    }

    fn line(variant: i64, product: i64, sku: &str, quantity: u32) -> CartProduct {
        CartProduct {
            product_variant_id: ProductVariantId::new(variant),
            product_id: ProductId::new(product),
            sku: Some(sku.to_string()),
            name: Some(format!("Cart {sku}")),
            quantity,
            price: Price::from_cents(5_990),
            list_price: Price::ZERO,
            image_url: None,
            customization: None,
        }
    }

    fn user(cpf: &str) -> User {
        User {
            id: Some("1".to_string()),
            email: "ana@example.com".to_string(),
            given_name: Some("Ana".to_string()),
            cpf: Some(cpf.to_string()),
            phone_number: Some("67999991234".to_string()),
        }
    }

    #[test]
    fn test_shipping_description_free_pickup_today() {
        assert_eq!(
            shipping_description(&quote(0, 0, "Retirada")),
            "Grátis - PAC - Poderá ser retirado hoje"
        );
    }

    #[test]
    fn test_shipping_description_pickup_in_days() {
        assert_eq!(
            shipping_description(&quote(0, 2, "Retirada")),
            "Grátis - PAC - Poderá ser retirado em 2 dias úteis"
        );
    }

    #[test]
    fn test_shipping_description_delivery() {
        assert_eq!(
            shipping_description(&quote(1_500, 0, "Entrega")),
            "R$\u{a0}15,00 - PAC - Será entrege hoje"
        );
        assert_eq!(
            shipping_description(&quote(1_500, 5, "Entrega")),
            "R$\u{a0}15,00 - PAC - Até 5 dias úteis para a entrega"
        );
    }

    #[test]
    fn test_sort_shipping_by_price() {
        let mut quotes = vec![quote(3_000, 1, "Entrega"), quote(0, 0, "Retirada"), quote(1_500, 5, "Entrega")];
        sort_shipping(&mut quotes);
        let values: Vec<Price> = quotes.iter().map(|q| q.value).collect();
        assert_eq!(
            values,
            vec![Price::ZERO, Price::from_cents(1_500), Price::from_cents(3_000)]
        );
    }

    #[test]
    fn test_totals_free_shipping() {
        let cart = Cart {
            subtotal: Price::from_cents(10_000),
            ..Cart::default()
        };
        let totals = Totals::for_cart(&cart);
        assert_eq!(totals.shipping_label(), "FRETE GRÁTIS");
        assert_eq!(totals.total(), Price::from_cents(10_000));

        let cart = Cart {
            subtotal: Price::from_cents(10_000),
            selected_shipping: Some(quote(0, 0, "Retirada")),
            ..Cart::default()
        };
        assert_eq!(Totals::for_cart(&cart).shipping_label(), "FRETE GRÁTIS");
    }

    #[test]
    fn test_totals_with_shipping() {
        let cart = Cart {
            subtotal: Price::from_cents(10_000),
            selected_shipping: Some(quote(1_550, 3, "Entrega")),
            ..Cart::default()
        };
        let totals = Totals::for_cart(&cart);
        assert_eq!(totals.shipping_label(), "R$\u{a0}15,50");
        assert_eq!(totals.total(), Price::from_cents(11_550));
    }

    #[test]
    fn test_full_products_follow_cart_order() {
        let cart = Cart {
            products: vec![line(2, 20, "B", 1), line(1, 10, "A", 3)],
            ..Cart::default()
        };
        let catalog: Vec<Product> = serde_json::from_value(json!([
            {
                "productID": "1", "sku": "A", "name": "Produto A",
                "offers": { "offers": [{ "price": 59.9, "priceSpecification": [
                    { "priceType": "https://schema.org/ListPrice", "price": 79.9 }
                ]}]}
            },
            { "productID": "2", "sku": "B", "name": "Produto B",
              "offers": { "offers": [{ "seller": "Parceiro", "price": 59.9 }] } },
            { "productID": "3", "sku": "C", "name": "Fora do carrinho" }
        ]))
        .unwrap();

        let lines = full_products(&cart, &catalog, "ABACATE");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Produto B");
        assert_eq!(lines[0].seller, "Parceiro");
        assert!(!lines[0].has_discount());
        assert_eq!(lines[1].name, "Produto A");
        assert_eq!(lines[1].seller, "ABACATE");
        assert!(lines[1].has_discount());
        assert_eq!(lines[1].display_price(), Price::from_cents(7_990));
    }

    #[test]
    fn test_full_products_fall_back_to_cart_data() {
        let cart = Cart {
            products: vec![line(9, 90, "Z", 1)],
            ..Cart::default()
        };
        let lines = full_products(&cart, &[], "ABACATE");
        assert_eq!(lines[0].name, "Cart Z");
        assert!(lines[0].properties.is_empty());
    }

    fn gift_customizations() -> ProductCustomizations {
        ProductCustomizations {
            product_variant_id: ProductVariantId::new(500),
            customizations: vec![
                Customization { customization_id: 7, name: "isGift".to_string() },
                Customization { customization_id: 8, name: "text".to_string() },
            ],
        }
    }

    #[test]
    fn test_gift_wrap_plan_with_message() {
        let cart_line = line(1, 10, "A", 2);
        let message = GiftMessage {
            from: "Ana".to_string(),
            to: "Bia".to_string(),
            message: "Feliz aniversário".to_string(),
        };

        let (remove, add) = gift_wrap_plan(&cart_line, &gift_customizations(), Some(&message)).unwrap();

        assert_eq!(remove, UpdateItemInput::remove(ProductVariantId::new(1)));
        assert_eq!(add.product_variant_id, ProductVariantId::new(500));
        assert_eq!(add.quantity, 2);
        assert_eq!(
            add.customization,
            vec![
                CustomizationInput { customization_id: 7, value: "Sim".to_string() },
                CustomizationInput {
                    customization_id: 8,
                    value: "De: Ana \nPara: Bia \nFeliz aniversário".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_gift_wrap_plan_without_message() {
        let (_, add) = gift_wrap_plan(&line(1, 10, "A", 1), &gift_customizations(), None).unwrap();
        assert_eq!(add.customization.len(), 1);
    }

    #[test]
    fn test_gift_wrap_requires_both_slots() {
        let partial = ProductCustomizations {
            product_variant_id: ProductVariantId::new(500),
            customizations: vec![Customization { customization_id: 7, name: "isGift".to_string() }],
        };
        assert!(gift_wrap_plan(&line(1, 10, "A", 1), &partial, None).is_none());
    }

    #[test]
    fn test_gift_wrap_plan_skips_wrapped_line() {
        let mut wrapped = line(1, 10, "A", 2);
        wrapped.customization = Some(LineCustomization {
            id: None,
            values: vec![CustomizationValue { name: "isGift".to_string(), value: Some("Sim".to_string()) }],
        });
        assert!(gift_wrap_plan(&wrapped, &gift_customizations(), None).is_none());
    }

    #[test]
    fn test_offers_gift_wrap_skips_wrapped_lines() {
        let mut map = HashMap::new();
        map.insert(ProductId::new(10), gift_customizations());

        let plain = line(1, 10, "A", 1);
        assert!(offers_gift_wrap(&plain, &map));

        let mut wrapped = line(1, 10, "A", 1);
        wrapped.customization = Some(LineCustomization {
            id: None,
            values: vec![CustomizationValue { name: "isGift".to_string(), value: Some("Sim".to_string()) }],
        });
        assert!(!offers_gift_wrap(&wrapped, &map));

        let other = line(2, 20, "B", 1);
        assert!(!offers_gift_wrap(&other, &map));
    }

    #[test]
    fn test_payment_data_pix_is_empty() {
        let data = payment_data(PaymentKind::Pix, &CardForm::default(), &user("52998224725")).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn test_payment_data_boleto() {
        let data = payment_data(PaymentKind::Boleto, &CardForm::default(), &user("529.982.247-25"))
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({ "cpf": "52998224725", "telefone": "67999991234" })
        );
    }

    #[test]
    fn test_payment_data_card() {
        let card = CardForm {
            number: "4111 1111 1111 1111".to_string(),
            name: " ANA SOUZA ".to_string(),
            month: "3".to_string(),
            year: "2027".to_string(),
            cvc: "123".to_string(),
        };
        let data = payment_data(PaymentKind::Card, &card, &user("52998224725")).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({
                "number": "4111111111111111",
                "name": "ANA SOUZA",
                "month": "03",
                "year": "2027",
                "cvc": "123",
                "expiry": "03/2027",
                "cpf": "52998224725"
            })
        );
    }

    #[test]
    fn test_payment_data_card_rejects_missing_fields() {
        let err = payment_data(PaymentKind::Card, &CardForm::default(), &user("52998224725")).unwrap_err();
        assert!(matches!(err, CheckoutError::MissingCardField("number")));
        assert_eq!(err.user_message(), "Preencha todos os dados do cartão.");
    }

    #[test]
    fn test_payment_data_rejects_invalid_cpf() {
        let err = payment_data(PaymentKind::Boleto, &CardForm::default(), &user("52998224726")).unwrap_err();
        assert!(matches!(err, CheckoutError::Cpf(_)));
    }

    #[test]
    fn test_completion_comment() {
        assert_eq!(completion_comment(PaymentKind::Card, 1_715_350_000_000), "Comentário Card 1715350000000");
        assert_eq!(completion_comment(PaymentKind::Boleto, 1), "Comentário Boleto 1");
    }

    #[test]
    fn test_gift_message_text() {
        let message = GiftMessage {
            from: "A".to_string(),
            to: "B".to_string(),
            message: "C".to_string(),
        };
        assert_eq!(message.text(), "De: A \nPara: B \nC");
    }
}
