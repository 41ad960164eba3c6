//! Abacate Storefront - checkout pages for the Abacate store.
//!
//! This binary serves the cart, shipping, payment and confirmation steps plus
//! login and signup on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, plain HTML forms with post/redirect/get
//! - Askama templates for server-side rendering
//! - Remote commerce platform for catalog, cart, checkout and accounts
//! - BrasilAPI for CEP lookups
//!
//! # State
//!
//! Sessions live in memory and only hold the checkout id and the customer
//! token. Everything else is refetched from the commerce platform.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;
use std::net::SocketAddr;

use abacate_storefront::{app, config::StorefrontConfig, state::AppState};
use sentry::integrations::tracing as sentry_tracing;
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Start Sentry when a DSN is configured. The guard flushes on drop.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Cow::Owned),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        ..Default::default()
    };
    let guard = sentry::init((dsn, options));

    tracing::info!(environment = ?config.sentry_environment, "Sentry enabled");
    Some(guard)
}

/// Warnings and errors become Sentry events; info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    use sentry_tracing::EventFilter;

    match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "abacate_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Invalid storefront configuration");

    // Sentry goes first so the tracing layer has a client to report to.
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let addr = config.socket_addr();
    let store = config.store_name.clone();
    let app = app::router(AppState::new(config).expect("Failed to build storefront state"));

    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Cannot listen on {addr}: {e}"));
    tracing::info!(%addr, %store, "checkout ready");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Storefront server failed");

    tracing::info!("checkout stopped");
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }

    tracing::info!("draining connections before shutdown");
}
