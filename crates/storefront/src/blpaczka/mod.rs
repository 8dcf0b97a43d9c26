//! BLPaczka parcel broker client.
//!
//! BLPaczka brokers shipments across Polish couriers (InPost, DPD, DHL and
//! others) behind a single REST API. The storefront uses it for:
//!
//! - courier offers shown as shipping options at checkout,
//! - authoritative re-pricing of the selected offer before order creation,
//! - pickup point (parcel locker) search,
//! - booking the shipment once the order exists.
//!
//! Authentication is a static `X-Api-Key` header. Payloads are snake_case
//! JSON with gross prices as decimal strings.

mod client;
pub mod types;

pub use client::BlPaczkaClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the BLPaczka API.
#[derive(Debug, Error)]
pub enum BlPaczkaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// API key cannot be sent as an HTTP header.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),
}
