//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cep` - Postal code lookup (BrasilAPI)
//! - `checkout` - Workflows chaining commerce calls for the checkout pages

pub mod cep;
pub mod checkout;
