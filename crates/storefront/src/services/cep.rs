//! CEP (postal code) lookup via BrasilAPI.
//!
//! Used to fill street, city and state on the signup and address forms.
//! Results are cached for 24 hours.

use std::time::Duration;

use abacate_core::Cep;
use moka::future::Cache;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors that can occur when looking up a CEP.
#[derive(Debug, Error)]
pub enum CepError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The CEP does not exist.
    #[error("CEP not found: {0}")]
    NotFound(String),

    /// The input is not an 8-digit CEP.
    #[error(transparent)]
    Invalid(#[from] abacate_core::CepError),

    /// BrasilAPI answered with an unexpected status.
    #[error("CEP service returned HTTP {0}")]
    Status(u16),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Map a non-success lookup status to its error.
fn status_error(status: StatusCode, cep: &Cep) -> Option<CepError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(CepError::NotFound(cep.to_string()))
    } else {
        Some(CepError::Status(status.as_u16()))
    }
}

/// Address data for a CEP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CepAddress {
    pub cep: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
}

/// BrasilAPI CEP v2 client.
#[derive(Clone)]
pub struct CepClient {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<Cep, CepAddress>,
}

impl CepClient {
    /// Create a new CEP client against `base_url` (e.g. `https://brasilapi.com.br`).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CepError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(24 * 60 * 60))
            .build();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// Look up the address for a CEP, masked or not.
    ///
    /// # Errors
    ///
    /// Returns `CepError::Invalid` for malformed input and
    /// `CepError::NotFound` when the CEP does not exist.
    #[instrument(skip(self))]
    pub async fn lookup(&self, raw: &str) -> Result<CepAddress, CepError> {
        let cep = Cep::parse(raw)?;

        if let Some(address) = self.cache.get(&cep).await {
            debug!("Cache hit for CEP");
            return Ok(address);
        }

        let url = format!("{}/api/cep/v2/{}", self.base_url, cep.as_str());
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if let Some(error) = status_error(status, &cep) {
            if !matches!(error, CepError::NotFound(_)) {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "CEP lookup returned non-success status"
                );
            }
            return Err(error);
        }

        let address: CepAddress = response
            .json()
            .await
            .map_err(|e| CepError::Parse(e.to_string()))?;

        self.cache.insert(cep, address.clone()).await;

        Ok(address)
    }
}
