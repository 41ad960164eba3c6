//! CLI command implementations.

pub mod cep;
pub mod document;

use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The input is not a valid CPF or CNPJ.
    #[error("{0}")]
    Document(#[from] abacate_core::DocumentError),

    /// The CEP lookup failed.
    #[error("{0}")]
    Cep(#[from] abacate_storefront::services::cep::CepError),
}
