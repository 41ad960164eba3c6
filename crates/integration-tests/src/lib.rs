//! Integration tests for the Abacate checkout.
//!
//! Every test starts its own in-memory commerce platform and a storefront
//! wired to it, both on ephemeral ports, then drives the storefront over
//! HTTP with a cookie-keeping client that does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p abacate-integration-tests
//! ```

pub mod platform;

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use abacate_storefront::{
    app,
    config::{CommerceConfig, StorefrontConfig},
    services::cep::CepAddress,
    state::AppState,
};
use axum::Router;
use reqwest::{Client, Response, StatusCode, header::LOCATION, redirect::Policy};
use secrecy::SecretString;
use tokio::net::TcpListener;

pub use platform::{CatalogItem, Customer, FakePlatform, PLATFORM_TOKEN};

pub const CUSTOMER_EMAIL: &str = "ana@abacate.test";
pub const CUSTOMER_PASSWORD: &str = "abacate-maduro-42";
pub const COUPON: &str = "ABACATE10";
pub const CEP: &str = "79002000";
pub const GOOGLE_CODE: &str = "google-auth-code";

/// Gift-wrappable shirt; two units in every new cart.
pub const SHIRT: CatalogItem = CatalogItem {
    variant_id: 101,
    product_id: 10,
    sku: "CAM-01",
    name: "Camiseta Abacate",
    price_cents: 5990,
    gift_wrap: true,
};

/// Mug; one unit in every new cart.
pub const MUG: CatalogItem = CatalogItem {
    variant_id: 202,
    product_id: 20,
    sku: "CAN-01",
    name: "Caneca Abacate",
    price_cents: 3500,
    gift_wrap: false,
};

/// The store most tests run against: a shirt and a mug in every new cart,
/// one customer, a R$ 10,00 coupon and one known CEP.
pub fn standard_platform() -> FakePlatform {
    FakePlatform::new()
        .with_product(SHIRT)
        .with_product(MUG)
        .with_starter_line(SHIRT.variant_id, 2)
        .with_starter_line(MUG.variant_id, 1)
        .with_customer(Customer::new(CUSTOMER_EMAIL, CUSTOMER_PASSWORD))
        .with_coupon(COUPON, 1000)
        .with_cep(CepAddress {
            cep: CEP.to_string(),
            state: "MS".to_string(),
            city: "Campo Grande".to_string(),
            neighborhood: Some("Centro".to_string()),
            street: Some("Rua 14 de Julho".to_string()),
        })
        .with_google_code(GOOGLE_CODE, CUSTOMER_EMAIL)
}

/// Bind an ephemeral port on the loopback interface.
async fn bind() -> TcpListener {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("Failed to bind test listener")
}

/// Serve `router` in the background and return its base URL.
async fn serve(router: Router) -> String {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Fake platform stopped");
    });
    format!("http://{addr}")
}

/// A running storefront and the platform behind it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub platform: FakePlatform,
}

impl TestContext {
    /// Start a storefront against `platform` with Google sign-in disabled.
    ///
    /// # Panics
    ///
    /// Panics if a listener cannot be bound or the storefront fails to start.
    pub async fn start(platform: FakePlatform) -> Self {
        Self::start_with(platform, None).await
    }

    /// Start a storefront against `platform`.
    ///
    /// # Panics
    ///
    /// Panics if a listener cannot be bound or the storefront fails to start.
    pub async fn start_with(platform: FakePlatform, google_client_id: Option<&str>) -> Self {
        let platform_url = serve(platform.router()).await;

        let listener = bind().await;
        let addr = listener.local_addr().expect("Failed to read local address");
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            store_name: "Abacate".to_string(),
            commerce: CommerceConfig {
                base_url: platform_url.clone(),
                api_token: SecretString::from(PLATFORM_TOKEN),
                timeout: Duration::from_secs(5),
            },
            cep_base_url: platform_url,
            google_client_id: google_client_id.map(str::to_string),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).expect("Failed to build storefront state");
        let app = app::router(state);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Storefront stopped");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            platform,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// Submit a form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// GET a page that must render, returning its HTML.
    ///
    /// # Panics
    ///
    /// Panics unless the page answers 200.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.text().await.expect("Failed to read page body")
    }

    /// Log in as the standard customer, returning the redirect target.
    ///
    /// # Panics
    ///
    /// Panics unless the login redirects.
    pub async fn login(&self, return_url: &str) -> String {
        let response = self
            .post(
                "/login",
                &[
                    ("input", CUSTOMER_EMAIL),
                    ("pass", CUSTOMER_PASSWORD),
                    ("return_url", return_url),
                ],
            )
            .await;
        location(&response).expect("Login did not redirect")
    }

    /// The single cart the platform holds.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one cart exists.
    pub fn cart(&self) -> abacate_storefront::commerce::Cart {
        let mut carts = self.platform.carts();
        assert_eq!(carts.len(), 1, "expected exactly one cart");
        carts.remove(0)
    }
}

/// Target of a redirect, when the response is one.
pub fn location(response: &Response) -> Option<String> {
    if !response.status().is_redirection() {
        return None;
    }
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
