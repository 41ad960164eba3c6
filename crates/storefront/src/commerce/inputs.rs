//! Props bodies for commerce loaders and actions.

use abacate_core::{ProductId, ProductVariantId};
use serde::Serialize;

/// Props of the `cart` loader.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<String>,
}

/// Props of the `productList` loader.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListProps {
    pub first: u32,
    pub sort_key: &'static str,
    pub sort_direction: &'static str,
    pub filters: ProductListFilters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductListFilters {
    pub sku: Vec<String>,
}

impl ProductListProps {
    /// First ten products matching `skus`, sorted by name.
    #[must_use]
    pub const fn by_skus(skus: Vec<String>) -> Self {
        Self {
            first: 10,
            sort_key: "NAME",
            sort_direction: "ASC",
            filters: ProductListFilters { sku: skus },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCustomizationsProps {
    pub product_id: ProductId,
}

/// A cart line and quantity, for `updateItem` and `calculatePrices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemInput {
    pub product_variant_id: ProductVariantId,
    pub quantity: u32,
}

impl UpdateItemInput {
    #[must_use]
    pub const fn new(product_variant_id: ProductVariantId, quantity: u32) -> Self {
        Self {
            product_variant_id,
            quantity,
        }
    }

    /// Remove the line from the cart.
    #[must_use]
    pub const fn remove(product_variant_id: ProductVariantId) -> Self {
        Self::new(product_variant_id, 0)
    }
}

/// Props of the `addItem` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemInput {
    pub product_variant_id: ProductVariantId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub customization: Vec<CustomizationInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationInput {
    pub customization_id: i64,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CouponInput {
    pub coupon: String,
}

/// Props of the `shippingSimulation` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSimulationInput {
    pub simulate_cart_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_selected_address: Option<bool>,
}

impl ShippingSimulationInput {
    /// Simulate the cart's items to a CEP.
    #[must_use]
    pub const fn for_cep(cep: String) -> Self {
        Self {
            simulate_cart_items: true,
            cep: Some(cep),
            use_selected_address: None,
        }
    }

    /// Simulate the cart's items to the cart's selected address.
    #[must_use]
    pub const fn for_selected_address() -> Self {
        Self {
            simulate_cart_items: true,
            cep: None,
            use_selected_address: Some(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectShippingInput {
    pub shipping_quote_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectAddressInput {
    pub address_id: String,
}

/// Props of the `createAddress` action.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressInput {
    pub address_details: String,
    pub address_number: String,
    pub city: String,
    pub cep: String,
    pub country: String,
    pub email: String,
    pub name: String,
    pub neighborhood: String,
    pub phone: String,
    pub state: String,
    pub street: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatePricesInput {
    pub products: Vec<UpdateItemInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPaymentInput {
    pub payment_method_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectInstallmentInput {
    pub installment_number: u32,
    pub selected_payment_method_id: String,
}

/// Props of the `completeCheckout` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCheckoutInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_data: Option<PaymentData>,
    pub comments: String,
}

/// Gateway payload sent with `completeCheckout`.
///
/// Implements `Debug` manually so card data never reaches the logs.
#[derive(Clone, Serialize)]
#[serde(untagged)]
pub enum PaymentData {
    Card {
        number: String,
        name: String,
        month: String,
        year: String,
        cvc: String,
        expiry: String,
        cpf: String,
    },
    Boleto {
        cpf: String,
        telefone: String,
    },
}

impl core::fmt::Debug for PaymentData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Card { .. } => f.write_str("PaymentData::Card([REDACTED])"),
            Self::Boleto { .. } => f.write_str("PaymentData::Boleto([REDACTED])"),
        }
    }
}

/// Props of the `login` action.
#[derive(Clone, Serialize)]
pub struct LoginInput {
    /// Email or CPF/CNPJ.
    pub input: String,
    pub pass: String,
}

impl core::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginInput")
            .field("input", &self.input)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLoginGoogleInput {
    pub code: String,
    pub redirect_uri: String,
}

/// Address and preference fields shared by the full signup forms.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupAddressFields {
    pub receiver_name: String,
    pub cep: String,
    pub address: String,
    pub address_number: String,
    pub address_complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub reference: String,
    pub newsletter: bool,
    pub reseller: bool,
}

/// Props of `signupPerson` and `signupPartialPerson`.
///
/// The partial variant leaves every `Option` empty.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupPersonInput {
    pub email: String,
    pub cpf: String,
    pub full_name: String,
    /// `d/m/yyyy`, unpadded.
    pub birth_date: String,
    pub primary_phone_area_code: String,
    /// `NNNNN-NNNN`.
    pub primary_phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_phone_area_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_phone_number: Option<String>,
    #[serde(flatten)]
    pub address: Option<SignupAddressFields>,
}

impl core::fmt::Debug for SignupPersonInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignupPersonInput")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Props of `signupCompany` and `signupPartialCompany`.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupCompanyInput {
    pub email: String,
    pub cnpj: String,
    pub corporate_name: String,
    pub primary_phone_area_code: String,
    pub primary_phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_phone_area_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_phone_number: Option<String>,
    #[serde(flatten)]
    pub address: Option<SignupAddressFields>,
}

impl core::fmt::Debug for SignupCompanyInput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignupCompanyInput")
            .field("email", &self.email)
            .field("corporate_name", &self.corporate_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_list_props_shape() {
        let props = ProductListProps::by_skus(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            serde_json::to_value(&props).unwrap(),
            json!({
                "first": 10,
                "sortKey": "NAME",
                "sortDirection": "ASC",
                "filters": { "sku": ["A", "B"] }
            })
        );
    }

    #[test]
    fn test_shipping_simulation_variants() {
        let by_cep = ShippingSimulationInput::for_cep("01001000".to_string());
        assert_eq!(
            serde_json::to_value(&by_cep).unwrap(),
            json!({ "simulateCartItems": true, "cep": "01001000" })
        );

        let by_address = ShippingSimulationInput::for_selected_address();
        assert_eq!(
            serde_json::to_value(&by_address).unwrap(),
            json!({ "simulateCartItems": true, "useSelectedAddress": true })
        );
    }

    #[test]
    fn test_add_item_omits_empty_customization() {
        let input = AddItemInput {
            product_variant_id: ProductVariantId::new(5),
            quantity: 1,
            customization: vec![],
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({ "productVariantId": 5, "quantity": 1 })
        );
    }

    #[test]
    fn test_payment_data_is_untagged_and_redacted() {
        let boleto = PaymentData::Boleto {
            cpf: "52998224725".to_string(),
            telefone: "67999991234".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&boleto).unwrap(),
            json!({ "cpf": "52998224725", "telefone": "67999991234" })
        );
        assert!(!format!("{boleto:?}").contains("52998224725"));
    }

    #[test]
    fn test_partial_signup_omits_full_fields() {
        let input = SignupPersonInput {
            email: "ana@example.com".to_string(),
            cpf: "52998224725".to_string(),
            full_name: "Ana Souza".to_string(),
            birth_date: "5/3/1990".to_string(),
            primary_phone_area_code: "67".to_string(),
            primary_phone_number: "99999-1234".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&input).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("gender").is_none());
        assert!(value.get("cep").is_none());
        assert!(value.get("secondaryPhoneAreaCode").is_none());
        assert_eq!(value["birthDate"], "5/3/1990");
        assert_eq!(value["primaryPhoneAreaCode"], "67");
    }

    #[test]
    fn test_full_signup_flattens_address() {
        let input = SignupPersonInput {
            gender: Some("FEMALE"),
            password: Some("s3nha".to_string()),
            address: Some(SignupAddressFields {
                cep: "01001000".to_string(),
                city: "São Paulo".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["gender"], "FEMALE");
        assert_eq!(value["cep"], "01001000");
        assert_eq!(value["city"], "São Paulo");
        assert_eq!(value["newsletter"], false);
        assert!(!format!("{input:?}").contains("s3nha"));
    }
}
