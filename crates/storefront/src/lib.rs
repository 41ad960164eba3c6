//! Abacate Storefront library.
//!
//! Server-rendered checkout pages (cart, shipping, payment, confirmation,
//! login and signup) backed by a remote commerce platform. The library is
//! what the binary and the integration tests share.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod commerce;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod views;
