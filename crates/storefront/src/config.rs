//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `COMMERCE_BASE_URL` - Commerce platform URL (loaders and actions live under `/live/invoke`)
//! - `COMMERCE_API_TOKEN` - Commerce platform API token (high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `COMMERCE_TIMEOUT_SECS` - Outbound request timeout (default: 15)
//! - `CEP_BASE_URL` - CEP lookup service (default: <https://brasilapi.com.br>)
//! - `STORE_NAME` - Seller name shown when a product has none (default: ABACATE)
//! - `GOOGLE_CLIENT_ID` - Enables "Entrar com Google"
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Seller name used when the catalog has none
    pub store_name: String,
    /// Commerce platform configuration
    pub commerce: CommerceConfig,
    /// CEP lookup service base URL
    pub cep_base_url: String,
    /// Google OAuth client ID (federated login is hidden when unset)
    pub google_client_id: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Commerce platform configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CommerceConfig {
    /// Platform base URL (e.g., <https://abacate.deco.site>)
    pub base_url: String,
    /// API token sent with every loader and action
    pub api_token: SecretString,
    /// Timeout for each outbound request
    pub timeout: Duration,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = trim_base_url(get_required_env("STOREFRONT_BASE_URL")?);
        validate_url("STOREFRONT_BASE_URL", &base_url)?;

        let commerce = CommerceConfig::from_env()?;
        let cep_base_url = trim_base_url(get_env_or_default(
            "CEP_BASE_URL",
            "https://brasilapi.com.br",
        ));
        validate_url("CEP_BASE_URL", &cep_base_url)?;

        Ok(Self {
            host,
            port,
            base_url,
            store_name: get_env_or_default("STORE_NAME", "ABACATE"),
            commerce,
            cep_base_url,
            google_client_id: get_optional_env("GOOGLE_CLIENT_ID"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (controls `Secure` cookies).
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = trim_base_url(get_required_env("COMMERCE_BASE_URL")?);
        validate_url("COMMERCE_BASE_URL", &base_url)?;
        let timeout_secs: u64 = parse_env("COMMERCE_TIMEOUT_SECS", "15")?;

        Ok(Self {
            base_url,
            api_token: token_from_env("COMMERCE_API_TOKEN")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Shannon entropy of `s`, in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    counts
        .values()
        .map(|&count| {
            let p = f64::from(count) / f64::from(total);
            -p * p.log2()
        })
        .sum()
}

/// Reject tokens that look copied from a template or typed by hand.
fn check_token(key: &str, token: &str) -> Result<(), ConfigError> {
    let lower = token.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("looks like a placeholder ('{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(token);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!(
                "{entropy:.2} bits/char is below {MIN_ENTROPY_BITS_PER_CHAR:.1}; paste the token the commerce platform issued"
            ),
        ));
    }

    Ok(())
}

/// Read a platform token and check it before wrapping it.
fn token_from_env(key: &str) -> Result<SecretString, ConfigError> {
    let token = get_required_env(key)?;
    check_token(key, &token)?;
    Ok(SecretString::from(token))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            store_name: "ABACATE".to_string(),
            commerce: CommerceConfig {
                base_url: "http://localhost:8000".to_string(),
                api_token: SecretString::from("super_secret_api_token"),
                timeout: Duration::from_secs(15),
            },
            cep_base_url: "https://brasilapi.com.br".to_string(),
            google_client_id: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_entropy_of_uniform_and_repeated_input() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("zzzzzz").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_token_is_rejected() {
        let result = check_token("TEST_VAR", "your-api-token-here");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_repetitive_token_is_rejected() {
        let result = check_token("TEST_VAR", "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_random_token_is_accepted() {
        let result = check_token("TEST_VAR", "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6");
        assert!(result.is_ok());
    }

    #[test]
    fn test_trim_base_url() {
        assert_eq!(
            trim_base_url("https://brasilapi.com.br/".to_string()),
            "https://brasilapi.com.br"
        );
        assert_eq!(trim_base_url("http://x".to_string()), "http://x");
    }

    #[test]
    fn test_validate_url_rejects_relative() {
        assert!(validate_url("X", "/relative").is_err());
        assert!(validate_url("X", "http://localhost:8000").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_https() {
        let mut config = test_config();
        assert!(!config.is_https());
        config.base_url = "https://loja.abacate.com.br".to_string();
        assert!(config.is_https());
    }

    #[test]
    fn test_commerce_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config().commerce);

        assert!(debug_output.contains("http://localhost:8000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_token"));
    }
}
