//! Response types for the commerce platform.
//!
//! Field names follow the platform's camelCase JSON. Catalog products use
//! schema.org property names (`productID`, `inProductGroupWithID`).

use abacate_core::{OrderStatus, Price, ProductId, ProductVariantId};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// `priceType` of the offer price specification holding the list price.
pub const LIST_PRICE_TYPE: &str = "https://schema.org/ListPrice";

/// Shipping quote type for in-store pickup.
pub const PICKUP_TYPE: &str = "Retirada";

/// Customization slot flagging a line as a gift.
pub const GIFT_SLOT: &str = "isGift";

/// Customization slot holding the gift message.
pub const GIFT_TEXT_SLOT: &str = "text";

/// Value stored in the gift slot of gift-wrapped lines.
pub const GIFT_YES: &str = "Sim";

// =============================================================================
// Cart Types
// =============================================================================

/// The shopper's cart (checkout) as returned by the `cart` loader and every
/// cart-mutating action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub checkout_id: String,
    #[serde(default, deserialize_with = "non_null")]
    pub products: Vec<CartProduct>,
    #[serde(default)]
    pub subtotal: Price,
    #[serde(default)]
    pub total: Price,
    #[serde(default)]
    pub selected_shipping: Option<ShippingQuote>,
    #[serde(default)]
    pub selected_address: Option<Address>,
    #[serde(default)]
    pub coupon: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub selected_payment_method: Option<SelectedPaymentMethod>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.products.iter().map(|p| p.quantity).sum()
    }

    /// Whether a coupon is applied.
    #[must_use]
    pub fn has_coupon(&self) -> bool {
        self.coupon.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// The most recent order placed with this checkout.
    #[must_use]
    pub fn last_order(&self) -> Option<&Order> {
        self.orders.last()
    }

    /// SKUs of all lines, in cart order.
    #[must_use]
    pub fn skus(&self) -> Vec<String> {
        self.products.iter().filter_map(|p| p.sku.clone()).collect()
    }
}

/// A cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub product_variant_id: ProductVariantId,
    pub product_id: ProductId,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub list_price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub customization: Option<LineCustomization>,
}

impl CartProduct {
    fn customization_value(&self, slot: &str) -> Option<&str> {
        self.customization
            .as_ref()?
            .values
            .iter()
            .find(|v| v.name == slot)
            .and_then(|v| v.value.as_deref())
    }

    /// Whether the line was gift-wrapped.
    #[must_use]
    pub fn is_gift(&self) -> bool {
        self.customization
            .as_ref()
            .is_some_and(|c| c.values.iter().any(|v| v.name == GIFT_SLOT))
    }

    /// Gift message, if one was written.
    #[must_use]
    pub fn gift_message(&self) -> Option<&str> {
        self.customization_value(GIFT_TEXT_SLOT)
            .filter(|v| !v.trim().is_empty())
    }

    /// Line total (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// Customization values attached to a cart line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCustomization {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub values: Vec<CustomizationValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

// =============================================================================
// Shipping Types
// =============================================================================

/// A shipping option returned by `shippingSimulation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuote {
    pub shipping_quote_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Price,
    /// Deadline in business days.
    #[serde(default)]
    pub deadline: u32,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl ShippingQuote {
    /// Whether the quote is an in-store pickup.
    #[must_use]
    pub fn is_pickup(&self) -> bool {
        self.kind == PICKUP_TYPE
    }

    /// Whether the quote costs nothing.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.value.is_zero()
    }
}

/// A delivery address.
///
/// The platform names the complement `addressDetails` on creation and
/// `complement` on reads; both are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "receiverName")]
    pub name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub address_number: Option<String>,
    #[serde(default, alias = "complement")]
    pub address_details: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub cep: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A catalog product (schema.org `Product` shape) from `productList`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Variant id, as a string.
    #[serde(rename = "productID")]
    pub product_id: String,
    /// Product group id, as a string.
    #[serde(rename = "inProductGroupWithID", default)]
    pub in_product_group_with_id: Option<String>,
    pub sku: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub image: Vec<ImageObject>,
    #[serde(default, deserialize_with = "non_null")]
    pub additional_property: Vec<PropertyValue>,
    #[serde(default)]
    pub offers: Option<AggregateOffer>,
}

impl Product {
    /// The variant id, when `productID` is numeric.
    #[must_use]
    pub fn variant_id(&self) -> Option<ProductVariantId> {
        self.product_id.parse().ok()
    }

    /// The product group id, when present and numeric.
    #[must_use]
    pub fn group_id(&self) -> Option<ProductId> {
        self.in_product_group_with_id.as_deref()?.parse().ok()
    }

    fn first_offer(&self) -> Option<&Offer> {
        self.offers.as_ref()?.offers.first()
    }

    /// Seller of the first offer.
    #[must_use]
    pub fn seller(&self) -> Option<&str> {
        self.first_offer()?.seller.as_deref()
    }

    /// List price from the first offer's price specifications.
    #[must_use]
    pub fn list_price(&self) -> Option<Price> {
        self.first_offer()?
            .price_specification
            .iter()
            .find(|spec| spec.price_type == LIST_PRICE_TYPE)
            .map(|spec| spec.price)
    }

    /// URL of the first image.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image.first().map(|img| img.url.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageObject {
    pub url: String,
}

/// A named product attribute (e.g. "Cor": "Verde").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateOffer {
    #[serde(default, deserialize_with = "non_null")]
    pub offers: Vec<Offer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default, deserialize_with = "non_null")]
    pub price_specification: Vec<UnitPriceSpecification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPriceSpecification {
    pub price_type: String,
    #[serde(default)]
    pub price: Price,
}

/// Customization slots of a product group, from `productCustomizations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCustomizations {
    /// Variant to add to the cart when customizing.
    pub product_variant_id: ProductVariantId,
    #[serde(default, deserialize_with = "non_null")]
    pub customizations: Vec<Customization>,
}

impl ProductCustomizations {
    /// Look up a slot by name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&Customization> {
        self.customizations.iter().find(|c| c.name == name)
    }

    /// The gift flag and gift text slots, when the product offers both.
    #[must_use]
    pub fn gift_slots(&self) -> Option<(&Customization, &Customization)> {
        Some((self.slot(GIFT_SLOT)?, self.slot(GIFT_TEXT_SLOT)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub customization_id: i64,
    pub name: String,
}

// =============================================================================
// Payment Types
// =============================================================================

/// A payment method offered for the checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl PaymentMethod {
    /// Kind derived from the display name.
    #[must_use]
    pub fn kind(&self) -> PaymentKind {
        self.name.as_deref().map_or(PaymentKind::Other, PaymentKind::from_name)
    }
}

/// How the shopper pays, derived from the method's display name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    Card,
    Pix,
    Boleto,
    Other,
}

impl PaymentKind {
    /// Classify a display name such as "Cartão de Crédito" or "Pix".
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.starts_with("cartão") || name.starts_with("cartao") {
            Self::Card
        } else if name.starts_with("pix") {
            Self::Pix
        } else if name.starts_with("boleto") {
            Self::Boleto
        } else {
            Self::Other
        }
    }

    /// Word used in the completion comment.
    #[must_use]
    pub const fn comment_label(self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::Pix => "Pix",
            Self::Boleto => "Boleto",
            Self::Other => "Other",
        }
    }
}

/// Payment method selected on the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPaymentMethod {
    pub id: String,
    #[serde(default)]
    pub selected_installment: Option<Installment>,
}

/// Response of `calculatePrices`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPrices {
    #[serde(default, deserialize_with = "non_null")]
    pub installment_plans: Vec<InstallmentPlan>,
}

impl PaymentPrices {
    /// Installments of the card plan (display name starting with "Cartão").
    #[must_use]
    pub fn card_installments(&self) -> &[Installment] {
        self.installment_plans
            .iter()
            .find(|plan| {
                plan.display_name
                    .as_deref()
                    .is_some_and(|n| PaymentKind::from_name(n) == PaymentKind::Card)
            })
            .map_or(&[], |plan| plan.installments.as_slice())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPlan {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub installments: Vec<Installment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    #[serde(default)]
    pub value: Price,
    /// Whether interest applies.
    #[serde(default)]
    pub fees: bool,
}

impl Installment {
    /// "À vista R$ 100,00 sem juros" or "3 parcelas R$ 35,00 com juros".
    #[must_use]
    pub fn label(&self) -> String {
        let count = if self.number <= 1 {
            "À vista".to_string()
        } else {
            format!("{} parcelas", self.number)
        };
        let fees = if self.fees { "com" } else { "sem" };
        format!("{count} {} {fees} juros", self.value.format())
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// An order placed by completing the checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "string_or_number")]
    pub order_id: String,
    pub order_status: OrderStatus,
    /// ISO-8601 timestamp.
    pub date: String,
    #[serde(default)]
    pub discount_value: Price,
    #[serde(default)]
    pub total_value: Price,
    #[serde(default)]
    pub dispatch_time_text: Option<String>,
    #[serde(default)]
    pub delivery: Option<Delivery>,
}

impl Order {
    /// Order date as `dd/mm/yyyy`, or the raw value when it cannot be parsed.
    #[must_use]
    pub fn formatted_date(&self) -> String {
        parse_date(&self.date).map_or_else(|| self.date.clone(), |d| d.format("%d/%m/%Y").to_string())
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cost: Price,
    #[serde(default)]
    pub delivery_time: Option<String>,
}

// =============================================================================
// Customer Types
// =============================================================================

/// The logged-in customer, from the `user` loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Token returned by login, signup and social login actions.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAccessToken {
    pub token: String,
    #[serde(default)]
    pub valid_until: Option<String>,
}

impl core::fmt::Debug for CustomerAccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CustomerAccessToken")
            .field("token", &"[REDACTED]")
            .field("valid_until", &self.valid_until)
            .finish()
    }
}

// =============================================================================
// Deserialization helpers
// =============================================================================

/// Lists may contain `null` entries; drop them.
fn non_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Int(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}
