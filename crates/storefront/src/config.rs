//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `WOO_BASE_URL` - WordPress origin of the WooCommerce shop
//! - `WOO_CONSUMER_KEY` - WooCommerce v3 REST consumer key
//! - `WOO_CONSUMER_SECRET` - WooCommerce v3 REST consumer secret
//! - `PLANETPAY_CLIENT_ID` - Planet Pay OAuth client ID
//! - `PLANETPAY_CLIENT_SECRET` - Planet Pay OAuth client secret
//! - `PLANETPAY_MERCHANT_ID` - Planet Pay merchant identifier
//! - `PLANETPAY_NOTIFICATION_SECRET` - HMAC key for payment notifications
//! - `BLPACZKA_API_KEY` - BLPaczka API key
//! - `SHIP_FROM_NAME` / `SHIP_FROM_STREET` / `SHIP_FROM_CITY` /
//!   `SHIP_FROM_POSTCODE` / `SHIP_FROM_EMAIL` / `SHIP_FROM_PHONE` - Dispatch
//!   address used as the sender on shipments
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `PLANETPAY_BASE_URL` - Gateway API base (default: production)
//! - `BLPACZKA_BASE_URL` - Broker API base (default: production)
//! - `SHIP_FROM_COUNTRY` - Sender country code (default: PL)
//! - `META_PIXEL_ID` - Meta (Facebook) pixel ID (image-only pixel)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry trace sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
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
    /// Session signing secret
    pub session_secret: SecretString,
    /// WooCommerce shop configuration
    pub woo: WooConfig,
    /// Planet Pay gateway configuration
    pub planetpay: PlanetPayConfig,
    /// BLPaczka broker configuration
    pub blpaczka: BlPaczkaConfig,
    /// Dispatch address used as the sender on shipments
    pub ship_from: ShipFromAddress,
    /// Analytics tracking configuration
    pub analytics: AnalyticsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry trace sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// WooCommerce shop configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct WooConfig {
    /// WordPress origin of the shop (e.g., <https://shop.example.pl>), no
    /// trailing slash
    pub base_url: String,
    /// WooCommerce v3 REST consumer key
    pub consumer_key: String,
    /// WooCommerce v3 REST consumer secret
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for WooConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooConfig")
            .field("base_url", &self.base_url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

/// Planet Pay gateway configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PlanetPayConfig {
    /// Gateway API base URL, no trailing slash
    pub base_url: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Merchant identifier included in payment create requests
    pub merchant_id: String,
    /// HMAC key for verifying server-to-server notifications
    pub notification_secret: SecretString,
}

impl std::fmt::Debug for PlanetPayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanetPayConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("merchant_id", &self.merchant_id)
            .field("notification_secret", &"[REDACTED]")
            .finish()
    }
}

/// BLPaczka broker configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BlPaczkaConfig {
    /// Broker API base URL, no trailing slash
    pub base_url: String,
    /// API key sent in the `X-Api-Key` header
    pub api_key: SecretString,
}

impl std::fmt::Debug for BlPaczkaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlPaczkaConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// The shop's dispatch address, used as the sender for courier searches and
/// shipment bookings.
#[derive(Debug, Clone)]
pub struct ShipFromAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

/// Analytics and tracking pixel configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsConfig {
    /// Meta (Facebook) pixel ID, rendered as an image-only pixel
    pub meta_pixel_id: Option<String>,
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

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let woo = WooConfig::from_env()?;
        let planetpay = PlanetPayConfig::from_env()?;
        let blpaczka = BlPaczkaConfig::from_env()?;
        let ship_from = ShipFromAddress::from_env()?;
        let analytics = AnalyticsConfig::from_env();

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string())
            })?;
        let sentry_traces_sample_rate = get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            woo,
            planetpay,
            blpaczka,
            ship_from,
            analytics,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl WooConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_base_url_env("WOO_BASE_URL")?,
            consumer_key: get_required_env("WOO_CONSUMER_KEY")?,
            consumer_secret: get_validated_secret("WOO_CONSUMER_SECRET")?,
        })
    }
}

impl PlanetPayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_base_url_or_default("PLANETPAY_BASE_URL", "https://api.planetpay.pl")?,
            client_id: get_required_env("PLANETPAY_CLIENT_ID")?,
            client_secret: get_validated_secret("PLANETPAY_CLIENT_SECRET")?,
            merchant_id: get_required_env("PLANETPAY_MERCHANT_ID")?,
            notification_secret: get_validated_secret("PLANETPAY_NOTIFICATION_SECRET")?,
        })
    }
}

impl BlPaczkaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_base_url_or_default("BLPACZKA_BASE_URL", "https://api.blpaczka.com")?,
            api_key: get_validated_secret("BLPACZKA_API_KEY")?,
        })
    }
}

impl ShipFromAddress {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            name: get_required_env("SHIP_FROM_NAME")?,
            street: get_required_env("SHIP_FROM_STREET")?,
            city: get_required_env("SHIP_FROM_CITY")?,
            postcode: get_required_env("SHIP_FROM_POSTCODE")?,
            country: get_env_or_default("SHIP_FROM_COUNTRY", "PL"),
            email: get_required_env("SHIP_FROM_EMAIL")?,
            phone: get_required_env("SHIP_FROM_PHONE")?,
        })
    }
}

impl AnalyticsConfig {
    fn from_env() -> Self {
        Self {
            meta_pixel_id: get_optional_env("META_PIXEL_ID"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required base URL, validated and normalized (no trailing slash).
fn get_base_url_env(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    normalize_base_url(key, &value)
}

/// Get a base URL with a default, validated and normalized.
fn get_base_url_or_default(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    normalize_base_url(key, &value)
}

/// Validate that a base URL parses and has a host; strip any trailing slash.
fn normalize_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL must have a host".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
