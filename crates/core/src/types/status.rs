//! Order status as reported by the commerce platform.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Order status.
///
/// The platform reports statuses as upper-case codes. Only the codes the
/// storefront labels specially are modelled; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    AwaitingPayment,
    Paid,
    Other(String),
}

impl OrderStatus {
    /// The platform's status code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::AwaitingPayment => "AWAITING_PAYMENT",
            Self::Paid => "PAID",
            Self::Other(code) => code,
        }
    }

    /// Label shown to the shopper.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::AwaitingPayment => "Aguardando Pagamento",
            Self::Paid => "Pago",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for OrderStatus {
    fn from(code: String) -> Self {
        match code.as_str() {
            "AWAITING_PAYMENT" => Self::AwaitingPayment,
            "PAID" => Self::Paid,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(code: &str) -> Self {
        Self::from(code.to_owned())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.code().to_owned()
    }
}
