//! Clients and configuration handed to every handler.

use std::sync::Arc;

use thiserror::Error;

use crate::commerce::{CommerceClient, CommerceError};
use crate::config::StorefrontConfig;
use crate::services::cep::{CepClient, CepError};

/// An outbound client could not be built at startup.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("commerce client: {0}")]
    Commerce(#[from] CommerceError),
    #[error("CEP client: {0}")]
    Cep(#[from] CepError),
}

/// Shared by clone; holds no per-shopper data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    cep: CepClient,
}

impl AppState {
    /// Build the commerce and CEP clients from `config`.
    ///
    /// # Errors
    ///
    /// Fails when either `reqwest` client rejects its settings.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let commerce = CommerceClient::new(&config.commerce)?;
        let cep = CepClient::new(&config.cep_base_url, config.commerce.timeout)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                cep,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Client for every cart, checkout and account operation.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    #[must_use]
    pub fn cep(&self) -> &CepClient {
        &self.inner.cep
    }
}
