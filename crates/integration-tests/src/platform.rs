//! In-memory commerce platform and CEP service.
//!
//! Speaks the `/live/invoke/{key}` protocol the storefront's commerce client
//! uses: carts are found by the `x-checkout-id` header, customers by the
//! `x-customer-token` header. Rejected input answers `400 {"message": ..}`,
//! unknown keys and products answer `404`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use abacate_core::{OrderStatus, Price, ProductId, ProductVariantId};
use abacate_storefront::commerce::{
    Address, AggregateOffer, CHECKOUT_ID_HEADER, CUSTOMER_TOKEN_HEADER, Cart, CartProduct,
    CustomerAccessToken, Customization, CustomizationValue, Delivery, GIFT_SLOT, GIFT_TEXT_SLOT,
    ImageObject, Installment, InstallmentPlan, LineCustomization, Offer, Order, PaymentMethod,
    PaymentPrices, Product, ProductCustomizations, SelectedPaymentMethod, ShippingQuote, User,
};
use abacate_storefront::services::cep::CepAddress;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

/// Bearer token the platform accepts.
pub const PLATFORM_TOKEN: &str = "fake-platform-token";

/// Timestamp stamped on every order.
pub const ORDER_DATE: &str = "2026-01-15T10:30:00Z";

/// Card number the platform declines.
pub const DECLINED_CARD: &str = "4000000000000002";

/// CEP the platform has no shipping coverage for.
pub const UNSERVED_CEP: &str = "69900000";

/// Payment method id of the credit card.
pub const CARD_METHOD_ID: &str = "1";

/// Payment method id of Pix.
pub const PIX_METHOD_ID: &str = "2";

/// Payment method id of the boleto.
pub const BOLETO_METHOD_ID: &str = "3";

/// Largest quantity a line accepts.
pub const MAX_QUANTITY: u32 = 10;

const GIFT_SLOT_ID: i64 = 1;
const TEXT_SLOT_ID: i64 = 2;
const MAX_INSTALLMENTS: u32 = 3;

const PAYMENT_METHODS: [(&str, &str); 3] = [
    (CARD_METHOD_ID, "Cartão de Crédito"),
    (PIX_METHOD_ID, "Pix"),
    (BOLETO_METHOD_ID, "Boleto Bancário"),
];

struct QuoteSpec {
    id: &'static str,
    name: &'static str,
    cents: i64,
    deadline: u32,
    kind: &'static str,
}

static QUOTES: [QuoteSpec; 3] = [
    QuoteSpec {
        id: "pac",
        name: "PAC",
        cents: 1500,
        deadline: 5,
        kind: "Entrega",
    },
    QuoteSpec {
        id: "sedex",
        name: "SEDEX",
        cents: 3000,
        deadline: 2,
        kind: "Entrega",
    },
    QuoteSpec {
        id: "loja",
        name: "Retirada na loja",
        cents: 0,
        deadline: 0,
        kind: "Retirada",
    },
];

impl QuoteSpec {
    fn find(id: &str) -> Option<&'static Self> {
        QUOTES.iter().find(|q| q.id == id)
    }

    fn to_quote(&self) -> ShippingQuote {
        ShippingQuote {
            shipping_quote_id: self.id.to_string(),
            name: self.name.to_string(),
            value: Price::from_cents(self.cents),
            deadline: self.deadline,
            kind: self.kind.to_string(),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub variant_id: i64,
    pub product_id: i64,
    pub sku: &'static str,
    pub name: &'static str,
    pub price_cents: i64,
    /// Whether the product offers gift wrapping.
    pub gift_wrap: bool,
}

impl CatalogItem {
    fn to_product(&self) -> Product {
        Product {
            product_id: self.variant_id.to_string(),
            in_product_group_with_id: Some(self.product_id.to_string()),
            sku: self.sku.to_string(),
            name: Some(self.name.to_string()),
            image: vec![ImageObject {
                url: format!("https://img.abacate.test/{}.jpg", self.sku),
            }],
            additional_property: Vec::new(),
            offers: Some(AggregateOffer {
                offers: vec![Offer {
                    seller: Some("ABACATE".to_string()),
                    price: Price::from_cents(self.price_cents),
                    price_specification: Vec::new(),
                }],
            }),
        }
    }
}

/// A registered customer.
#[derive(Debug, Clone)]
pub struct Customer {
    pub email: String,
    pub password: Option<String>,
    pub name: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    /// A person with a valid CPF and a mobile phone.
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: Some(password.to_string()),
            name: "Ana".to_string(),
            cpf: Some("529.982.247-25".to_string()),
            phone: Some("67999991234".to_string()),
        }
    }

    fn matches_login(&self, input: &str) -> bool {
        let input = input.trim();
        self.email.eq_ignore_ascii_case(input)
            || self
                .cpf
                .as_deref()
                .is_some_and(|cpf| !digits(input).is_empty() && digits(cpf) == digits(input))
    }
}

#[derive(Debug, Clone)]
struct Line {
    item: CatalogItem,
    quantity: u32,
    customization: Vec<(String, String)>,
}

impl Line {
    fn to_product(&self) -> CartProduct {
        CartProduct {
            product_variant_id: ProductVariantId::new(self.item.variant_id),
            product_id: ProductId::new(self.item.product_id),
            sku: Some(self.item.sku.to_string()),
            name: Some(self.item.name.to_string()),
            quantity: self.quantity,
            price: Price::from_cents(self.item.price_cents),
            list_price: Price::from_cents(self.item.price_cents),
            image_url: None,
            customization: (!self.customization.is_empty()).then(|| LineCustomization {
                id: None,
                values: self
                    .customization
                    .iter()
                    .map(|(name, value)| CustomizationValue {
                        name: name.clone(),
                        value: Some(value.clone()),
                    })
                    .collect(),
            }),
        }
    }

    fn total_cents(&self) -> i64 {
        self.item.price_cents * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default)]
struct FakeCart {
    checkout_id: String,
    lines: Vec<Line>,
    shipping: Option<&'static str>,
    address: Option<Address>,
    coupon: Option<(String, i64)>,
    payment: Option<SelectedPaymentMethod>,
    orders: Vec<Order>,
    owner: Option<String>,
}

impl FakeCart {
    fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(Line::total_cents).sum()
    }

    fn quote(&self) -> Option<&'static QuoteSpec> {
        self.shipping.and_then(QuoteSpec::find)
    }

    fn discount_cents(&self) -> i64 {
        self.coupon.as_ref().map_or(0, |(_, cents)| *cents)
    }

    fn total_cents(&self) -> i64 {
        let shipping = self.quote().map_or(0, |q| q.cents);
        (self.subtotal_cents() + shipping - self.discount_cents()).max(0)
    }

    fn to_cart(&self) -> Cart {
        Cart {
            checkout_id: self.checkout_id.clone(),
            products: self.lines.iter().map(Line::to_product).collect(),
            subtotal: Price::from_cents(self.subtotal_cents()),
            total: Price::from_cents(self.total_cents()),
            selected_shipping: self.quote().map(QuoteSpec::to_quote),
            selected_address: self.address.clone(),
            coupon: self.coupon.as_ref().map(|(code, _)| code.clone()),
            orders: self.orders.clone(),
            selected_payment_method: self.payment.clone(),
        }
    }
}

/// A rejected call.
#[derive(Debug)]
enum Failure {
    Rejected(String),
    NotFound,
    Unauthorized,
    Unavailable,
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": message })),
            )
                .into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Unavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

fn reject(message: &str) -> Failure {
    Failure::Rejected(message.to_string())
}

type Reply = Result<Value, Failure>;

fn reply<T: Serialize>(value: T) -> Reply {
    serde_json::to_value(value).map_err(|e| Failure::Rejected(e.to_string()))
}

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// One loader or action call.
struct Invocation {
    checkout_id: Option<String>,
    token: Option<String>,
    props: Value,
}

impl Invocation {
    fn props<T: DeserializeOwned>(&self) -> Result<T, Failure> {
        serde_json::from_value(self.props.clone())
            .map_err(|e| Failure::Rejected(format!("invalid props: {e}")))
    }
}

// =============================================================================
// Props
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartProps {
    #[serde(default)]
    cart_id: Option<String>,
}

#[derive(Deserialize)]
struct ProductListProps {
    filters: ProductListFilters,
}

#[derive(Deserialize)]
struct ProductListFilters {
    sku: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomizationsProps {
    product_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemProps {
    product_variant_id: i64,
    quantity: u32,
    #[serde(default)]
    customization: Vec<CustomizationProps>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomizationProps {
    customization_id: i64,
    value: String,
}

#[derive(Deserialize)]
struct CouponProps {
    coupon: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulationProps {
    #[serde(default)]
    cep: Option<String>,
    #[serde(default)]
    use_selected_address: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectShippingProps {
    shipping_quote_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectAddressProps {
    address_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressProps {
    name: String,
    street: String,
    address_number: String,
    #[serde(default)]
    address_details: String,
    neighborhood: String,
    city: String,
    state: String,
    cep: String,
    phone: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectPaymentProps {
    payment_method_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectInstallmentProps {
    installment_number: u32,
    selected_payment_method_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionProps {
    #[serde(default)]
    payment_data: Option<Value>,
}

#[derive(Deserialize)]
struct LoginProps {
    input: String,
    pass: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupProps {
    email: String,
    #[serde(default)]
    cpf: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    corporate_name: Option<String>,
    #[serde(default)]
    password: Option<String>,
    primary_phone_area_code: String,
    primary_phone_number: String,
}

#[derive(Deserialize)]
struct GoogleProps {
    code: String,
}

// =============================================================================
// Platform
// =============================================================================

#[derive(Default)]
struct Platform {
    catalog: Vec<CatalogItem>,
    starter_lines: Vec<(i64, u32)>,
    customers: Vec<Customer>,
    coupons: HashMap<String, i64>,
    ceps: HashMap<String, CepAddress>,
    google_codes: HashMap<String, String>,
    tokens: HashMap<String, String>,
    addresses: HashMap<String, Vec<Address>>,
    carts: HashMap<String, FakeCart>,
    received: Vec<(String, Value)>,
    broken: HashSet<String>,
    next_id: u64,
}

impl Platform {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn item(&self, variant_id: i64) -> Option<&CatalogItem> {
        self.catalog.iter().find(|i| i.variant_id == variant_id)
    }

    fn dispatch(&mut self, key: &str, call: &Invocation) -> Reply {
        match key {
            "cart" => self.load_cart(call),
            "checkoutCoupon" => {
                let cart = self.cart_mut(call)?;
                Ok(json!(cart.coupon.as_ref().map(|(code, _)| code)))
            }
            "productList" => self.product_list(call),
            "productCustomizations" => self.product_customizations(call),
            "updateItem" => self.update_item(call),
            "addItem" => self.add_item(call),
            "addCoupon" => self.add_coupon(call),
            "removeCoupon" => {
                let cart = self.cart_mut(call)?;
                cart.coupon = None;
                reply(cart.to_cart())
            }
            "shippingSimulation" => self.shipping_simulation(call),
            "selectShipping" => self.select_shipping(call),
            "userAddresses" => {
                let email = self.customer_email(call)?;
                reply(self.addresses.get(&email).cloned().unwrap_or_default())
            }
            "selectAddress" => self.select_address(call),
            "createAddress" => self.create_address(call),
            "paymentMethods" => reply(
                PAYMENT_METHODS
                    .iter()
                    .map(|(id, name)| PaymentMethod {
                        id: (*id).to_string(),
                        name: Some((*name).to_string()),
                    })
                    .collect::<Vec<_>>(),
            ),
            "calculatePrices" => self.calculate_prices(call),
            "selectPayment" => self.select_payment(call),
            "selectInstallment" => self.select_installment(call),
            "completeCheckout" => self.complete_checkout(call),
            "associateCheckout" => {
                let email = self.customer_email(call)?;
                let cart = self.cart_mut(call)?;
                cart.owner = Some(email);
                Ok(json!({}))
            }
            "user" => self.user(call),
            "login" => self.login(call),
            "logout" => {
                if let Some(token) = &call.token {
                    self.tokens.remove(token);
                }
                Ok(json!({}))
            }
            "signupPerson" | "signupPartialPerson" | "signupCompany" | "signupPartialCompany" => {
                self.signup(call)
            }
            "socialLoginGoogle" => {
                let props: GoogleProps = call.props()?;
                let email = self
                    .google_codes
                    .get(&props.code)
                    .cloned()
                    .ok_or_else(|| reject("Código de autorização inválido"))?;
                self.issue_token(email)
            }
            _ => Err(Failure::NotFound),
        }
    }

    fn cart_mut(&mut self, call: &Invocation) -> Result<&mut FakeCart, Failure> {
        call.checkout_id
            .as_ref()
            .and_then(|id| self.carts.get_mut(id))
            .ok_or_else(|| reject("Carrinho não encontrado"))
    }

    fn customer_email(&self, call: &Invocation) -> Result<String, Failure> {
        call.token
            .as_ref()
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .ok_or_else(|| reject("Usuário não autenticado"))
    }

    fn issue_token(&mut self, email: String) -> Reply {
        let token = format!("tok-{}", self.next_id());
        self.tokens.insert(token.clone(), email);
        reply(CustomerAccessToken {
            token,
            valid_until: Some("2026-12-31T23:59:59Z".to_string()),
        })
    }

    fn load_cart(&mut self, call: &Invocation) -> Reply {
        let props: CartProps = call.props()?;
        if let Some(id) = props.cart_id {
            return self
                .carts
                .get(&id)
                .map(FakeCart::to_cart)
                .ok_or(Failure::NotFound)
                .and_then(reply);
        }
        if let Some(cart) = call.checkout_id.as_ref().and_then(|id| self.carts.get(id)) {
            return reply(cart.to_cart());
        }

        let checkout_id = format!("chk-{}", self.next_id());
        let lines = self
            .starter_lines
            .iter()
            .filter_map(|(variant_id, quantity)| {
                Some(Line {
                    item: self.item(*variant_id)?.clone(),
                    quantity: *quantity,
                    customization: Vec::new(),
                })
            })
            .collect();
        let cart = FakeCart {
            checkout_id: checkout_id.clone(),
            lines,
            ..FakeCart::default()
        };
        let view = cart.to_cart();
        self.carts.insert(checkout_id, cart);
        reply(view)
    }

    fn product_list(&self, call: &Invocation) -> Reply {
        let props: ProductListProps = call.props()?;
        reply(
            self.catalog
                .iter()
                .filter(|item| props.filters.sku.iter().any(|sku| sku == item.sku))
                .map(CatalogItem::to_product)
                .collect::<Vec<_>>(),
        )
    }

    /// `null` for products that cannot be customized, as the platform does.
    fn product_customizations(&self, call: &Invocation) -> Reply {
        let props: CustomizationsProps = call.props()?;
        let Some(item) = self
            .catalog
            .iter()
            .find(|item| item.product_id == props.product_id && item.gift_wrap)
        else {
            return Ok(Value::Null);
        };
        reply(ProductCustomizations {
            product_variant_id: ProductVariantId::new(item.variant_id),
            customizations: vec![
                Customization {
                    customization_id: GIFT_SLOT_ID,
                    name: GIFT_SLOT.to_string(),
                },
                Customization {
                    customization_id: TEXT_SLOT_ID,
                    name: GIFT_TEXT_SLOT.to_string(),
                },
            ],
        })
    }

    fn update_item(&mut self, call: &Invocation) -> Reply {
        let props: ItemProps = call.props()?;
        if props.quantity > MAX_QUANTITY {
            return Err(reject("Quantidade indisponível em estoque"));
        }

        let cart = self.cart_mut(call)?;
        let index = cart
            .lines
            .iter()
            .position(|l| l.item.variant_id == props.product_variant_id)
            .ok_or_else(|| reject("Produto não está no carrinho"))?;

        if props.quantity == 0 {
            cart.lines.remove(index);
        } else if let Some(line) = cart.lines.get_mut(index) {
            line.quantity = props.quantity;
        }
        if cart.lines.is_empty() {
            cart.shipping = None;
        }
        reply(cart.to_cart())
    }

    fn add_item(&mut self, call: &Invocation) -> Reply {
        let props: ItemProps = call.props()?;
        let item = self
            .item(props.product_variant_id)
            .cloned()
            .ok_or_else(|| reject("Produto não encontrado"))?;
        let customization = props
            .customization
            .into_iter()
            .filter_map(|c| {
                let slot = match c.customization_id {
                    GIFT_SLOT_ID => GIFT_SLOT,
                    TEXT_SLOT_ID => GIFT_TEXT_SLOT,
                    _ => return None,
                };
                Some((slot.to_string(), c.value))
            })
            .collect();

        let cart = self.cart_mut(call)?;
        cart.lines.push(Line {
            item,
            quantity: props.quantity,
            customization,
        });
        reply(cart.to_cart())
    }

    fn add_coupon(&mut self, call: &Invocation) -> Reply {
        let props: CouponProps = call.props()?;
        let discount = self
            .coupons
            .get(&props.coupon)
            .copied()
            .ok_or_else(|| reject("Cupom inválido"))?;
        let cart = self.cart_mut(call)?;
        cart.coupon = Some((props.coupon, discount));
        reply(cart.to_cart())
    }

    fn shipping_simulation(&mut self, call: &Invocation) -> Reply {
        let props: SimulationProps = call.props()?;
        let cart = self.cart_mut(call)?;
        let cep = if props.use_selected_address == Some(true) {
            cart.address.as_ref().and_then(|a| a.cep.clone())
        } else {
            props.cep
        };

        match cep.as_deref() {
            None => Err(reject("Informe o CEP")),
            Some(UNSERVED_CEP) => Err(reject("Não entregamos neste CEP")),
            Some(_) => reply(QUOTES.iter().map(QuoteSpec::to_quote).collect::<Vec<_>>()),
        }
    }

    fn select_shipping(&mut self, call: &Invocation) -> Reply {
        let props: SelectShippingProps = call.props()?;
        let quote = QuoteSpec::find(&props.shipping_quote_id)
            .ok_or_else(|| reject("Frete indisponível"))?;
        let cart = self.cart_mut(call)?;
        cart.shipping = Some(quote.id);
        reply(cart.to_cart())
    }

    fn select_address(&mut self, call: &Invocation) -> Reply {
        let props: SelectAddressProps = call.props()?;
        let email = self.customer_email(call)?;
        let address = self
            .addresses
            .get(&email)
            .and_then(|list| list.iter().find(|a| a.id == props.address_id))
            .cloned()
            .ok_or_else(|| reject("Endereço não encontrado"))?;

        let cart = self.cart_mut(call)?;
        cart.address = Some(address);
        cart.shipping = None;
        reply(cart.to_cart())
    }

    fn create_address(&mut self, call: &Invocation) -> Reply {
        let props: AddressProps = call.props()?;
        let email = self.customer_email(call)?;
        if [&props.street, &props.address_number, &props.city, &props.state]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(reject("Endereço incompleto"));
        }

        let address = Address {
            id: self.next_id().to_string(),
            name: Some(props.name),
            street: Some(props.street),
            address_number: Some(props.address_number),
            address_details: Some(props.address_details),
            neighborhood: Some(props.neighborhood),
            city: Some(props.city),
            state: Some(props.state),
            cep: Some(props.cep),
            country: Some("BR".to_string()),
            phone: Some(props.phone),
        };
        self.addresses
            .entry(email)
            .or_default()
            .push(address.clone());
        reply(address)
    }

    fn calculate_prices(&mut self, call: &Invocation) -> Reply {
        let total = self.cart_mut(call)?.total_cents();
        reply(PaymentPrices {
            installment_plans: vec![
                InstallmentPlan {
                    display_name: Some("Cartão de Crédito".to_string()),
                    installments: (1..=MAX_INSTALLMENTS)
                        .map(|n| installment(total, n))
                        .collect(),
                },
                InstallmentPlan {
                    display_name: Some("Pix".to_string()),
                    installments: vec![installment(total, 1)],
                },
            ],
        })
    }

    fn select_payment(&mut self, call: &Invocation) -> Reply {
        let props: SelectPaymentProps = call.props()?;
        if !PAYMENT_METHODS
            .iter()
            .any(|(id, _)| *id == props.payment_method_id)
        {
            return Err(reject("Forma de pagamento inválida"));
        }
        let cart = self.cart_mut(call)?;
        cart.payment = Some(SelectedPaymentMethod {
            id: props.payment_method_id,
            selected_installment: None,
        });
        reply(cart.to_cart())
    }

    fn select_installment(&mut self, call: &Invocation) -> Reply {
        let props: SelectInstallmentProps = call.props()?;
        if !(1..=MAX_INSTALLMENTS).contains(&props.installment_number) {
            return Err(reject("Parcelamento indisponível"));
        }

        let cart = self.cart_mut(call)?;
        let total = cart.total_cents();
        let payment = cart
            .payment
            .as_mut()
            .filter(|p| p.id == props.selected_payment_method_id)
            .ok_or_else(|| reject("Selecione a forma de pagamento"))?;
        payment.selected_installment = Some(installment(total, props.installment_number));
        reply(cart.to_cart())
    }

    fn complete_checkout(&mut self, call: &Invocation) -> Reply {
        let props: CompletionProps = call.props()?;
        let order_id = 1000 + self.next_id();
        let cart = self.cart_mut(call)?;

        if cart.lines.is_empty() {
            return Err(reject("Carrinho vazio"));
        }
        let quote = cart.quote().ok_or_else(|| reject("Selecione o frete"))?;
        if cart.address.is_none() {
            return Err(reject("Selecione o endereço de entrega"));
        }
        let method = cart
            .payment
            .as_ref()
            .map(|p| p.id.clone())
            .ok_or_else(|| reject("Selecione a forma de pagamento"))?;

        if method == CARD_METHOD_ID {
            let number = props
                .payment_data
                .as_ref()
                .and_then(|data| data.get("number"))
                .and_then(Value::as_str);
            match number {
                None => return Err(reject("Dados do cartão ausentes")),
                Some(DECLINED_CARD) => return Err(reject("Cartão recusado")),
                Some(_) => {}
            }
        }

        let order = Order {
            order_id: order_id.to_string(),
            order_status: OrderStatus::AwaitingPayment,
            date: ORDER_DATE.to_string(),
            discount_value: Price::from_cents(cart.discount_cents()),
            total_value: Price::from_cents(cart.total_cents()),
            dispatch_time_text: None,
            delivery: Some(Delivery {
                name: Some(quote.name.to_string()),
                cost: Price::from_cents(quote.cents),
                delivery_time: Some(format!("{} dias úteis", quote.deadline)),
            }),
        };
        cart.orders.push(order);
        Ok(json!({ "orderId": order_id }))
    }

    fn user(&self, call: &Invocation) -> Reply {
        let Ok(email) = self.customer_email(call) else {
            return Ok(Value::Null);
        };
        let Some((index, customer)) = self
            .customers
            .iter()
            .enumerate()
            .find(|(_, c)| c.email == email)
        else {
            return Ok(Value::Null);
        };
        reply(User {
            id: Some((index + 1).to_string()),
            email: customer.email.clone(),
            given_name: Some(customer.name.clone()),
            cpf: customer.cpf.clone(),
            phone_number: customer.phone.clone(),
        })
    }

    fn login(&mut self, call: &Invocation) -> Reply {
        let props: LoginProps = call.props()?;
        let email = self
            .customers
            .iter()
            .find(|c| c.matches_login(&props.input) && c.password.as_deref() == Some(props.pass.as_str()))
            .map(|c| c.email.clone())
            .ok_or_else(|| reject("Usuário ou senha inválidos"))?;
        self.issue_token(email)
    }

    fn signup(&mut self, call: &Invocation) -> Reply {
        let props: SignupProps = call.props()?;
        if self.customers.iter().any(|c| c.email.eq_ignore_ascii_case(&props.email)) {
            return Err(reject("E-mail já cadastrado"));
        }

        self.customers.push(Customer {
            email: props.email.clone(),
            password: props.password,
            name: props.full_name.or(props.corporate_name).unwrap_or_default(),
            cpf: props.cpf,
            phone: Some(format!(
                "{}{}",
                props.primary_phone_area_code,
                digits(&props.primary_phone_number)
            )),
        });
        self.issue_token(props.email)
    }
}

fn installment(total_cents: i64, number: u32) -> Installment {
    Installment {
        number,
        value: Price::from_cents(total_cents / i64::from(number.max(1))),
        fees: false,
    }
}

// =============================================================================
// Public handle
// =============================================================================

/// Shared handle to the in-memory platform.
///
/// Build it with the `with_*` methods, serve [`FakePlatform::router`], then
/// inspect what the storefront did through the accessors.
#[derive(Clone, Default)]
pub struct FakePlatform {
    inner: Arc<Mutex<Platform>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Platform> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn with_product(self, item: CatalogItem) -> Self {
        self.lock().catalog.push(item);
        self
    }

    /// Every new cart starts with `quantity` units of `variant_id`.
    #[must_use]
    pub fn with_starter_line(self, variant_id: i64, quantity: u32) -> Self {
        self.lock().starter_lines.push((variant_id, quantity));
        self
    }

    #[must_use]
    pub fn with_customer(self, customer: Customer) -> Self {
        self.lock().customers.push(customer);
        self
    }

    /// A coupon worth `cents` off the total.
    #[must_use]
    pub fn with_coupon(self, code: &str, cents: i64) -> Self {
        self.lock().coupons.insert(code.to_string(), cents);
        self
    }

    #[must_use]
    pub fn with_cep(self, address: CepAddress) -> Self {
        self.lock().ceps.insert(address.cep.clone(), address);
        self
    }

    /// A Google authorization code that signs in `email`.
    #[must_use]
    pub fn with_google_code(self, code: &str, email: &str) -> Self {
        self.lock()
            .google_codes
            .insert(code.to_string(), email.to_string());
        self
    }

    /// Every call to `key` answers 500 from now on.
    #[must_use]
    pub fn with_broken(self, key: &str) -> Self {
        self.lock().broken.insert(key.to_string());
        self
    }

    /// Router serving the invoke endpoint and the CEP service.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/live/invoke/{key}", post(invoke))
            .route("/api/cep/v2/{cep}", get(cep_lookup))
            .with_state(self.clone())
    }

    /// Keys invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().received.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Props received for `key`, in order.
    pub fn payloads(&self, key: &str) -> Vec<Value> {
        self.lock()
            .received
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, props)| props.clone())
            .collect()
    }

    /// Every cart, in no particular order.
    pub fn carts(&self) -> Vec<Cart> {
        self.lock().carts.values().map(FakeCart::to_cart).collect()
    }

    /// Customer a cart was associated with.
    pub fn cart_owner(&self, checkout_id: &str) -> Option<String> {
        self.lock().carts.get(checkout_id)?.owner.clone()
    }

    pub fn addresses(&self, email: &str) -> Vec<Address> {
        self.lock().addresses.get(email).cloned().unwrap_or_default()
    }

    pub fn has_customer(&self, email: &str) -> bool {
        self.lock().customers.iter().any(|c| c.email == email)
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn invoke(
    State(platform): State<FakePlatform>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(props): Json<Value>,
) -> Response {
    let expected = format!("Bearer {PLATFORM_TOKEN}");
    if header(&headers, AUTHORIZATION.as_str()).as_deref() != Some(expected.as_str()) {
        return Failure::Unauthorized.into_response();
    }

    let call = Invocation {
        checkout_id: header(&headers, CHECKOUT_ID_HEADER),
        token: header(&headers, CUSTOMER_TOKEN_HEADER),
        props,
    };

    let mut state = platform.lock();
    state.received.push((key.clone(), call.props.clone()));
    if state.broken.contains(&key) {
        return Failure::Unavailable.into_response();
    }
    match state.dispatch(&key, &call) {
        Ok(value) => Json(value).into_response(),
        Err(failure) => failure.into_response(),
    }
}

async fn cep_lookup(State(platform): State<FakePlatform>, Path(cep): Path<String>) -> Response {
    let found = platform.lock().ceps.get(&cep).cloned();
    found.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |address| Json(address).into_response(),
    )
}
