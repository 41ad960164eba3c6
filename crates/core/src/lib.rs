//! Abacate Core - Shared checkout types.
//!
//! This crate provides the pure types used across all Abacate components:
//! - `storefront` - Checkout pages (cart, shipping, payment, confirmation)
//! - `cli` - Command-line tools for documents and CEP lookups
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Money, Brazilian documents and postal codes, input masks,
//!   type-safe IDs and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
