//! View models for the checkout templates.
//!
//! Templates only print strings: prices, masks and labels are formatted here
//! so the markup stays free of logic.

use abacate_core::{Price, mask_cep};

use crate::commerce::{
    Address, Cart, Installment, Order, PaymentMethod, SelectedPaymentMethod, ShippingQuote, User,
};
use crate::services::checkout::{CartLine, Totals, shipping_description};

// =============================================================================
// Breadcrumb
// =============================================================================

/// Checkout step highlighted in the breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Cart,
    Shipping,
    Payment,
}

/// Breadcrumb display data: current step and who is logged in.
#[derive(Debug, Clone)]
pub struct BreadcrumbView {
    pub step: Step,
    pub user_name: String,
    pub logged_in: bool,
}

impl BreadcrumbView {
    #[must_use]
    pub fn new(step: Step, user: Option<&User>) -> Self {
        let user_name = user.map_or_else(
            || "Not logged".to_string(),
            |u| u.given_name.clone().unwrap_or_else(|| u.email.clone()),
        );

        Self {
            step,
            user_name,
            logged_in: user.is_some(),
        }
    }

    #[must_use]
    pub fn is_cart(&self) -> bool {
        self.step == Step::Cart
    }

    #[must_use]
    pub fn is_shipping(&self) -> bool {
        self.step == Step::Shipping
    }

    #[must_use]
    pub fn is_payment(&self) -> bool {
        self.step == Step::Payment
    }
}

// =============================================================================
// Cart lines and summary
// =============================================================================

/// Additional product property (e.g. `Cor: Verde`).
#[derive(Debug, Clone)]
pub struct PropertyView {
    pub name: String,
    pub value: String,
}

/// Cart line display data.
#[derive(Debug, Clone)]
pub struct LineView {
    pub variant_id: String,
    pub name: String,
    pub seller: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub quantity_plus: u32,
    /// Zero removes the line.
    pub quantity_minus: u32,
    pub price: String,
    /// List price, only when above the sale price.
    pub list_price: Option<String>,
    pub line_total: String,
    pub properties: Vec<PropertyView>,
    pub is_gift: bool,
    pub gift_message: Option<String>,
}

impl From<&CartLine> for LineView {
    fn from(line: &CartLine) -> Self {
        Self {
            variant_id: line.line.product_variant_id.to_string(),
            name: line.name.clone(),
            seller: line.seller.clone(),
            image_url: line.image_url.clone(),
            quantity: line.line.quantity,
            quantity_plus: line.line.quantity.saturating_add(1),
            quantity_minus: line.line.quantity.saturating_sub(1),
            price: line.line.price.format(),
            list_price: line.has_discount().then(|| line.list_price.format()),
            line_total: line.line.line_total().format(),
            properties: line
                .properties
                .iter()
                .map(|(name, value)| PropertyView {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
            is_gift: line.line.is_gift(),
            gift_message: line.line.gift_message().map(str::to_string),
        }
    }
}

/// Order summary box (subtotal, shipping, total).
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub coupon: Option<String>,
}

impl From<&Cart> for SummaryView {
    fn from(cart: &Cart) -> Self {
        let totals = Totals::for_cart(cart);

        Self {
            item_count: cart.item_count(),
            subtotal: totals.subtotal.format(),
            shipping: totals.shipping_label(),
            total: totals.total().format(),
            coupon: cart.coupon.clone().filter(|c| !c.is_empty()),
        }
    }
}

// =============================================================================
// Shipping
// =============================================================================

/// A shipping quote as a radio option.
#[derive(Debug, Clone)]
pub struct ShippingOptionView {
    pub id: String,
    pub description: String,
    pub selected: bool,
}

/// Quotes as options, marking the cart's selected one.
#[must_use]
pub fn shipping_options(
    quotes: &[ShippingQuote],
    selected: Option<&ShippingQuote>,
) -> Vec<ShippingOptionView> {
    let selected_id = selected.map(|q| q.shipping_quote_id.as_str());

    quotes
        .iter()
        .map(|quote| ShippingOptionView {
            id: quote.shipping_quote_id.clone(),
            description: shipping_description(quote),
            selected: selected_id == Some(quote.shipping_quote_id.as_str()),
        })
        .collect()
}

/// Address display data.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: String,
    pub receiver: String,
    /// "Rua X, 123"
    pub street_line: String,
    pub details: Option<String>,
    /// "Centro - Campo Grande/MS"
    pub district_line: String,
    pub cep: String,
    pub selected: bool,
}

impl AddressView {
    #[must_use]
    pub fn new(address: &Address, selected: Option<&Address>) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        let street_line = match address.address_number.as_deref() {
            Some(number) if !number.is_empty() => format!("{}, {number}", text(&address.street)),
            _ => text(&address.street),
        };

        Self {
            id: address.id.clone(),
            receiver: text(&address.name),
            street_line,
            details: address.address_details.clone().filter(|d| !d.trim().is_empty()),
            district_line: format!(
                "{} - {}/{}",
                text(&address.neighborhood),
                text(&address.city),
                text(&address.state)
            ),
            cep: mask_cep(address.cep.as_deref().unwrap_or_default()),
            selected: selected.is_some_and(|s| s.id == address.id),
        }
    }
}

/// Line that can be gift-wrapped on the shipping page.
#[derive(Debug, Clone)]
pub struct GiftLineView {
    pub variant_id: String,
    pub name: String,
}

/// Federative unit option for the address form.
#[derive(Debug, Clone, Copy)]
pub struct StateOption {
    pub uf: &'static str,
    pub name: &'static str,
}

pub const BRAZILIAN_STATES: [StateOption; 27] = [
    StateOption { uf: "AC", name: "Acre" },
    StateOption { uf: "AL", name: "Alagoas" },
    StateOption { uf: "AP", name: "Amapá" },
    StateOption { uf: "AM", name: "Amazonas" },
    StateOption { uf: "BA", name: "Bahia" },
    StateOption { uf: "CE", name: "Ceará" },
    StateOption { uf: "DF", name: "Distrito Federal" },
    StateOption { uf: "ES", name: "Espírito Santo" },
    StateOption { uf: "GO", name: "Goiás" },
    StateOption { uf: "MA", name: "Maranhão" },
    StateOption { uf: "MT", name: "Mato Grosso" },
    StateOption { uf: "MS", name: "Mato Grosso do Sul" },
    StateOption { uf: "MG", name: "Minas Gerais" },
    StateOption { uf: "PA", name: "Pará" },
    StateOption { uf: "PB", name: "Paraíba" },
    StateOption { uf: "PR", name: "Paraná" },
    StateOption { uf: "PE", name: "Pernambuco" },
    StateOption { uf: "PI", name: "Piauí" },
    StateOption { uf: "RJ", name: "Rio de Janeiro" },
    StateOption { uf: "RN", name: "Rio Grande do Norte" },
    StateOption { uf: "RS", name: "Rio Grande do Sul" },
    StateOption { uf: "RO", name: "Rondônia" },
    StateOption { uf: "RR", name: "Roraima" },
    StateOption { uf: "SC", name: "Santa Catarina" },
    StateOption { uf: "SP", name: "São Paulo" },
    StateOption { uf: "SE", name: "Sergipe" },
    StateOption { uf: "TO", name: "Tocantins" },
];

// =============================================================================
// Payment
// =============================================================================

/// Payment method as a radio option.
#[derive(Debug, Clone)]
pub struct PaymentMethodView {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

impl PaymentMethodView {
    #[must_use]
    pub fn new(method: &PaymentMethod, selected: Option<&SelectedPaymentMethod>) -> Self {
        Self {
            id: method.id.clone(),
            name: method.name.clone().unwrap_or_else(|| method.id.clone()),
            selected: selected.is_some_and(|s| s.id == method.id),
        }
    }
}

/// Installment as a select option.
#[derive(Debug, Clone)]
pub struct InstallmentView {
    pub number: u32,
    pub label: String,
    pub selected: bool,
}

impl InstallmentView {
    #[must_use]
    pub fn new(installment: &Installment, selected: Option<&SelectedPaymentMethod>) -> Self {
        let selected_number = selected
            .and_then(|s| s.selected_installment.as_ref())
            .map(|i| i.number);

        Self {
            number: installment.number,
            label: installment.label(),
            selected: selected_number == Some(installment.number),
        }
    }
}

// =============================================================================
// Confirmation
// =============================================================================

/// Placed order display data.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub order_id: String,
    pub status: String,
    pub date: String,
    /// `R$ -x`, only when a discount applies.
    pub discount: Option<String>,
    pub total: String,
    pub delivery_name: String,
    pub delivery_cost: String,
    pub delivery_time: Option<String>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let delivery = order.delivery.as_ref();
        let cost = delivery.map_or(Price::ZERO, |d| d.cost);

        Self {
            order_id: order.order_id.clone(),
            status: order.order_status.label().to_string(),
            date: order.formatted_date(),
            discount: order
                .discount_value
                .is_positive()
                .then(|| order.discount_value.format_as_discount()),
            total: order.total_value.format(),
            delivery_name: delivery.and_then(|d| d.name.clone()).unwrap_or_default(),
            delivery_cost: if cost.is_zero() {
                "Frete Grátis".to_string()
            } else {
                cost.format()
            },
            delivery_time: delivery
                .and_then(|d| d.delivery_time.clone())
                .or_else(|| order.dispatch_time_text.clone()),
        }
    }
}

/// Purchased line on the confirmation page.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub seller: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub total: String,
}

impl From<&CartLine> for OrderLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            name: line.name.clone(),
            seller: line.seller.clone(),
            image_url: line.image_url.clone(),
            quantity: line.line.quantity,
            total: line.line.line_total().format(),
        }
    }
}
