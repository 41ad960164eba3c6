//! Signup route handlers.
//!
//! Person (CPF) and company (CNPJ) accounts. The partial variant
//! (`?partial=true`) asks only for identity and phone; the full one adds a
//! password, an address and preferences. Documents and phones are validated
//! here before the platform sees them, then the new account is logged in.

use abacate_core::{Cep, Cnpj, Cpf, Phone};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::auth::complete_login;
use super::{error_message, fill_blank, redirect_with_error};
use crate::commerce::{
    CommerceError, CustomerAccessToken, SignupAddressFields, SignupCompanyInput,
    SignupPersonInput,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::{Shopper, safe_return_url};
use crate::services::cep::CepError;
use crate::state::AppState;
use crate::views::{BRAZILIAN_STATES, StateOption};

// =============================================================================
// Form and Query Types
// =============================================================================

/// Query parameters of the signup page.
#[derive(Debug, Default, Deserialize)]
pub struct SignupQuery {
    #[serde(default)]
    pub partial: bool,
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
    pub error: Option<String>,
}

/// Signup form data shared by the person and company forms.
///
/// No `Debug`: the form carries the password.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub partial: bool,
    pub return_url: Option<String>,
    pub email: String,

    // Person
    pub cpf: String,
    pub full_name: String,
    /// `yyyy-mm-dd` from the date input.
    pub birth_date: String,
    pub gender: String,

    // Company
    pub cnpj: String,
    pub corporate_name: String,

    pub password: String,
    pub password_confirmation: String,
    pub primary_phone_number: String,
    pub secondary_phone_number: String,

    // Address and preferences (full form only)
    pub receiver_name: String,
    pub cep: String,
    pub address: String,
    pub address_number: String,
    pub address_complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub reference: String,
    pub newsletter: Option<String>,
    pub reseller: Option<String>,
}

/// The validated phone and password fields common to both account kinds.
struct Contact {
    primary: Phone,
    secondary: Option<Phone>,
    password: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
    pub partial: bool,
    pub return_url: String,
    pub states: &'static [StateOption],
}

// =============================================================================
// Helpers
// =============================================================================

/// Path of the signup page, keeping the variant and the return URL.
fn signup_path(partial: bool, return_url: Option<&str>) -> String {
    let mut params = Vec::new();
    if partial {
        params.push("partial=true".to_string());
    }
    if let Some(url) = safe_return_url(return_url) {
        params.push(format!("returnUrl={}", urlencoding::encode(&url)));
    }

    if params.is_empty() {
        "/signup".to_string()
    } else {
        format!("/signup?{}", params.join("&"))
    }
}

/// Birth date as the platform expects it: `d/m/yyyy`, unpadded.
fn format_birth_date(raw: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    Some(format!("{}/{}/{}", date.day(), date.month(), date.year()))
}

/// Gender codes accepted by the platform.
fn parse_gender(raw: &str) -> Option<&'static str> {
    match raw {
        "MALE" => Some("MALE"),
        "FEMALE" => Some("FEMALE"),
        _ => None,
    }
}

/// Validate phones and, for the full form, the password confirmation.
///
/// Returns the error code to show on failure.
fn validate_contact(form: &SignupForm) -> std::result::Result<Contact, &'static str> {
    let primary = Phone::parse(&form.primary_phone_number).map_err(|_| "phone")?;
    let secondary =
        Phone::parse_optional(Some(&form.secondary_phone_number)).map_err(|_| "phone")?;

    let password = if form.partial {
        None
    } else {
        if form.password.is_empty() || form.password != form.password_confirmation {
            return Err("password");
        }
        Some(form.password.clone())
    };

    Ok(Contact {
        primary,
        secondary,
        password,
    })
}

/// Build the address part of a full signup, filling blanks from the CEP.
///
/// Returns the error code to show on failure.
async fn address_fields(
    state: &AppState,
    form: &SignupForm,
) -> std::result::Result<SignupAddressFields, &'static str> {
    let cep = Cep::parse(&form.cep).map_err(|_| "cep")?;

    let mut street = form.address.trim().to_string();
    let mut neighborhood = form.neighborhood.trim().to_string();
    let mut city = form.city.trim().to_string();
    let mut uf = form.state.trim().to_string();

    if [&street, &neighborhood, &city, &uf]
        .iter()
        .any(|v| v.is_empty())
    {
        match state.cep().lookup(cep.as_str()).await {
            Ok(found) => {
                fill_blank(&mut street, found.street);
                fill_blank(&mut neighborhood, found.neighborhood);
                fill_blank(&mut city, Some(found.city));
                fill_blank(&mut uf, Some(found.state));
            }
            Err(CepError::NotFound(_)) => return Err("cep-not-found"),
            Err(e) => warn!(error = %e, "CEP lookup failed, keeping the form values"),
        }
    }

    Ok(SignupAddressFields {
        receiver_name: form.receiver_name.trim().to_string(),
        cep: cep.as_str().to_string(),
        address: street,
        address_number: form.address_number.trim().to_string(),
        address_complement: form.address_complement.trim().to_string(),
        neighborhood,
        city,
        state: uf,
        reference: form.reference.trim().to_string(),
        newsletter: form.newsletter.is_some(),
        reseller: form.reseller.is_some(),
    })
}

/// Log the new account in, or go back to the form when the platform refuses.
async fn finish_signup(
    state: &AppState,
    shopper: &mut Shopper,
    result: std::result::Result<CustomerAccessToken, CommerceError>,
    back: &str,
    return_url: Option<&str>,
) -> Result<Redirect> {
    match result {
        Ok(access) => complete_login(state, shopper, access, return_url).await,
        Err(CommerceError::UserError(message)) => {
            warn!(%message, "Signup rejected");
            Ok(redirect_with_error(back, "signup"))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the signup page.
#[instrument]
pub async fn signup_page(Query(query): Query<SignupQuery>) -> SignupTemplate {
    SignupTemplate {
        error: query.error.as_deref().map(|c| error_message(c).to_string()),
        partial: query.partial,
        return_url: safe_return_url(query.return_url.as_deref()).unwrap_or_default(),
        states: &BRAZILIAN_STATES,
    }
}

/// Create a person account.
#[instrument(skip(state, shopper, form))]
pub async fn signup_person(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Form(form): Form<SignupForm>,
) -> Result<Redirect> {
    let return_url = form.return_url.as_deref();
    let back = signup_path(form.partial, return_url);

    let Ok(cpf) = Cpf::parse(&form.cpf) else {
        return Ok(redirect_with_error(&back, "cpf"));
    };
    let Some(birth_date) = format_birth_date(&form.birth_date) else {
        return Ok(redirect_with_error(&back, "birth-date"));
    };
    let contact = match validate_contact(&form) {
        Ok(contact) => contact,
        Err(code) => return Ok(redirect_with_error(&back, code)),
    };

    let (gender, address) = if form.partial {
        (None, None)
    } else {
        let Some(gender) = parse_gender(&form.gender) else {
            return Ok(redirect_with_error(&back, "signup"));
        };
        match address_fields(&state, &form).await {
            Ok(address) => (Some(gender), Some(address)),
            Err(code) => return Ok(redirect_with_error(&back, code)),
        }
    };

    let input = SignupPersonInput {
        email: form.email.trim().to_string(),
        cpf: cpf.formatted(),
        full_name: form.full_name.trim().to_string(),
        birth_date,
        primary_phone_area_code: contact.primary.area_code,
        primary_phone_number: contact.primary.number,
        gender,
        password: contact.password.clone(),
        password_confirmation: contact.password,
        secondary_phone_area_code: contact.secondary.as_ref().map(|p| p.area_code.clone()),
        secondary_phone_number: contact.secondary.map(|p| p.number),
        address,
    };

    let result = state
        .commerce()
        .signup_person(&input, form.partial, &shopper.ctx)
        .await;
    finish_signup(&state, &mut shopper, result, &back, return_url).await
}

/// Create a company account.
#[instrument(skip(state, shopper, form))]
pub async fn signup_company(
    State(state): State<AppState>,
    mut shopper: Shopper,
    Form(form): Form<SignupForm>,
) -> Result<Redirect> {
    let return_url = form.return_url.as_deref();
    let back = signup_path(form.partial, return_url);

    let Ok(cnpj) = Cnpj::parse(&form.cnpj) else {
        return Ok(redirect_with_error(&back, "cnpj"));
    };
    let contact = match validate_contact(&form) {
        Ok(contact) => contact,
        Err(code) => return Ok(redirect_with_error(&back, code)),
    };

    let address = if form.partial {
        None
    } else {
        match address_fields(&state, &form).await {
            Ok(address) => Some(address),
            Err(code) => return Ok(redirect_with_error(&back, code)),
        }
    };

    let input = SignupCompanyInput {
        email: form.email.trim().to_string(),
        cnpj: cnpj.formatted(),
        corporate_name: form.corporate_name.trim().to_string(),
        primary_phone_area_code: contact.primary.area_code,
        primary_phone_number: contact.primary.number,
        password: contact.password.clone(),
        password_confirmation: contact.password,
        secondary_phone_area_code: contact.secondary.as_ref().map(|p| p.area_code.clone()),
        secondary_phone_number: contact.secondary.map(|p| p.number),
        address,
    };

    let result = state
        .commerce()
        .signup_company(&input, form.partial, &shopper.ctx)
        .await;
    finish_signup(&state, &mut shopper, result, &back, return_url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_form() -> SignupForm {
        SignupForm {
            email: "ana@example.com".to_string(),
            cpf: "529.982.247-25".to_string(),
            full_name: "Ana Souza".to_string(),
            birth_date: "1990-03-07".to_string(),
            gender: "FEMALE".to_string(),
            password: "segredo123".to_string(),
            password_confirmation: "segredo123".to_string(),
            primary_phone_number: "(67) 99999-8888".to_string(),
            ..SignupForm::default()
        }
    }

    #[test]
    fn test_birth_date_is_unpadded() {
        assert_eq!(format_birth_date("1990-03-07").as_deref(), Some("7/3/1990"));
        assert_eq!(format_birth_date("2001-12-25").as_deref(), Some("25/12/2001"));
        assert_eq!(format_birth_date("07/03/1990"), None);
        assert_eq!(format_birth_date(""), None);
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(parse_gender("MALE"), Some("MALE"));
        assert_eq!(parse_gender("FEMALE"), Some("FEMALE"));
        assert_eq!(parse_gender(""), None);
    }

    #[test]
    fn test_signup_path_keeps_variant() {
        assert_eq!(signup_path(false, None), "/signup");
        assert_eq!(signup_path(true, None), "/signup?partial=true");
        assert_eq!(
            signup_path(true, Some("/frete")),
            "/signup?partial=true&returnUrl=%2Ffrete"
        );
    }

    #[test]
    fn test_validate_contact_splits_phones() {
        let mut form = full_form();
        form.secondary_phone_number = "6733334444".to_string();

        let Ok(contact) = validate_contact(&form) else {
            panic!("contact should be valid");
        };
        assert_eq!(contact.primary.area_code, "67");
        assert_eq!(contact.primary.number, "99999-8888");
        let secondary = contact.secondary.as_ref().map(|p| p.number.as_str());
        assert_eq!(secondary, Some("33334-444"));
        assert_eq!(contact.password.as_deref(), Some("segredo123"));
    }

    #[test]
    fn test_validate_contact_rejects_mismatched_password() {
        let mut form = full_form();
        form.password_confirmation = "outra".to_string();
        assert_eq!(validate_contact(&form).err(), Some("password"));

        form.partial = true;
        let contact = validate_contact(&form).ok();
        assert!(contact.is_some_and(|c| c.password.is_none()));
    }

    #[test]
    fn test_validate_contact_rejects_bad_phone() {
        let mut form = full_form();
        form.primary_phone_number = "1234".to_string();
        assert_eq!(validate_contact(&form).err(), Some("phone"));

        let mut form = full_form();
        form.secondary_phone_number = "99".to_string();
        assert_eq!(validate_contact(&form).err(), Some("phone"));
    }
}
