//! WooCommerce API clients.
//!
//! # Architecture
//!
//! - WooCommerce is source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//!
//! # APIs
//!
//! ## Store API (`/wp-json/wc/store/v1`)
//! - Products and categories, read-only, unauthenticated
//! - Prices arrive as minor-unit strings with `currency_minor_unit`
//!
//! ## v3 REST API (`/wp-json/wc/v3`)
//! - Orders and payment gateways
//! - HTTP basic auth with consumer key/secret, server-side only
//!
//! # Example
//!
//! ```rust,ignore
//! use makrama_storefront::woo::{CatalogClient, OrdersClient};
//!
//! let catalog = CatalogClient::new(&config.woo);
//! let product = catalog.get_product_by_slug("lniana-torba").await?;
//!
//! let orders = OrdersClient::new(&config.woo);
//! let order = orders.create_order(&draft).await?;
//! ```

mod catalog;
mod orders;
pub mod types;

pub use catalog::{CatalogClient, ProductQuery};
pub use orders::OrdersClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with WooCommerce APIs.
#[derive(Debug, Error)]
pub enum WooError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by WooCommerce.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Extract a readable message from a WooCommerce error body.
///
/// WooCommerce error responses carry `{"code": ..., "message": ..., "data": ...}`;
/// anything else (WAF pages, HTML) is truncated raw.
pub(crate) fn api_error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        code: String,
        #[serde(default)]
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(e) if !e.message.is_empty() => {
            if e.code.is_empty() {
                e.message
            } else {
                format!("{}: {}", e.code, e.message)
            }
        }
        _ => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woo_error_display() {
        let err = WooError::NotFound("product lniana-torba".to_string());
        assert_eq!(err.to_string(), "Not found: product lniana-torba");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = WooError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_api_error_display() {
        let err = WooError::Api {
            status: 400,
            message: "woocommerce_rest_invalid_id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error: 400 - woocommerce_rest_invalid_id"
        );
    }

    #[test]
    fn test_api_error_message_parses_woo_body() {
        let body = r#"{"code":"woocommerce_rest_product_invalid_id","message":"Invalid ID.","data":{"status":404}}"#;
        assert_eq!(
            api_error_message(body),
            "woocommerce_rest_product_invalid_id: Invalid ID."
        );
    }

    #[test]
    fn test_api_error_message_truncates_non_json() {
        let body = "<html>".repeat(100);
        let message = api_error_message(&body);
        assert_eq!(message.chars().count(), 200);
    }
}
