//! Handler errors and their HTTP responses.
//!
//! Form handlers turn expected failures into `?error=` redirects themselves;
//! whatever reaches [`AppError`] is rendered as a plain status page, and 5xx
//! responses are reported to Sentry first.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::commerce::CommerceError;
use crate::services::cep::CepError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce platform call failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// CEP lookup failed.
    #[error("CEP error: {0}")]
    Cep(#[from] CepError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Commerce(e) => Self::Commerce(e),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Commerce(CommerceError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Commerce(CommerceError::UserError(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Commerce(CommerceError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Commerce(_) => StatusCode::BAD_GATEWAY,
            Self::Cep(CepError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Cep(CepError::Invalid(_)) => StatusCode::BAD_REQUEST,
            Self::Cep(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// Text shown to the shopper. Upstream details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Commerce(CommerceError::UserError(msg)) | Self::BadRequest(msg) => msg.clone(),
            Self::Commerce(CommerceError::NotFound(_)) | Self::NotFound(_) => {
                "Não encontrado".to_string()
            }
            Self::Cep(CepError::NotFound(_)) => "CEP não encontrado".to_string(),
            Self::Cep(CepError::Invalid(_)) => "CEP inválido".to_string(),
            Self::Commerce(_) | Self::Cep(_) => "Serviço externo indisponível".to_string(),
            Self::Session(_) | Self::Internal(_) => "Erro interno do servidor".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, %status, sentry_event_id = %event_id, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

/// Handler result.
pub type Result<T> = std::result::Result<T, AppError>;

/// Tag later Sentry events with the logged-in customer.
pub fn set_sentry_user(user_id: Option<&str>, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: user_id.map(String::from),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Forget the customer on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record a checkout step so a later Sentry event shows how the shopper got there.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let data = data
        .unwrap_or_default()
        .iter()
        .map(|(key, value)| ((*key).to_string(), serde_json::Value::from(*value)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order".to_string());
        assert_eq!(err.to_string(), "Not found: order");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_commerce_failures_are_bad_gateway() {
        let err = CommerceError::Status {
            key: "cart".to_string(),
            status: 500,
        };
        assert_eq!(get_status(err.into()), StatusCode::BAD_GATEWAY);
        assert_eq!(
            get_status(CommerceError::Timeout("cart".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_commerce_not_found_and_user_errors() {
        assert_eq!(
            get_status(CommerceError::NotFound("cart".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CommerceError::UserError("Cupom inválido".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_cep_error_status_codes() {
        assert_eq!(
            get_status(CepError::NotFound("00000-000".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CepError::Invalid(abacate_core::CepError::InvalidLength(3)).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(CepError::Status(503).into()), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_upstream_details() {
        let err = AppError::from(CommerceError::Status {
            key: "cart".to_string(),
            status: 500,
        });
        assert_eq!(err.public_message(), "Serviço externo indisponível");

        let err = AppError::from(CommerceError::UserError("Cupom expirado".to_string()));
        assert_eq!(err.public_message(), "Cupom expirado");

        let err = AppError::Internal("pool exhausted".to_string());
        assert_eq!(err.public_message(), "Erro interno do servidor");
    }

    #[test]
    fn test_checkout_errors_map_to_bad_request() {
        let err: AppError = CheckoutError::NoPaymentMethod.into();
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
    }
}
