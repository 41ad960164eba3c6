//! CEP lookup command.

use std::time::Duration;

use abacate_core::mask_cep;
use abacate_storefront::services::cep::{CepAddress, CepClient, CepError};

/// Look up a CEP with the same client the storefront uses.
///
/// # Errors
///
/// Returns an error if the CEP is invalid, unknown, or the service fails.
pub async fn lookup(
    cep: &str,
    base_url: &str,
    timeout_secs: u64,
) -> Result<CepAddress, CepError> {
    let timeout = Duration::from_secs(timeout_secs);
    let client = CepClient::new(base_url, timeout)?;
    tracing::debug!(cep, base_url, "Looking up CEP");
    client.lookup(cep).await
}

/// Human-readable lines for an address.
pub fn describe(address: &CepAddress) -> Vec<String> {
    let mut lines = vec![format!("CEP: {}", mask_cep(&address.cep))];
    if let Some(street) = address.street.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Logradouro: {street}"));
    }
    if let Some(neighborhood) = address.neighborhood.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Bairro: {neighborhood}"));
    }
    lines.push(format!("Cidade: {}/{}", address.city, address.state));
    lines
}
