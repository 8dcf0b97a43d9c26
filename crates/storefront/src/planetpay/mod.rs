//! Planet Pay payment gateway client.
//!
//! # Architecture
//!
//! - OAuth client-credentials token, cached in memory and refreshed before
//!   expiry
//! - Amounts are always minor units (grosze for PLN)
//! - Server-to-server notifications are verified with HMAC-SHA256 before
//!   being trusted
//!
//! # Example
//!
//! ```rust,ignore
//! use makrama_storefront::planetpay::{PlanetPayClient, PaymentRequest};
//!
//! let gateway = PlanetPayClient::new(&config.planetpay);
//! let payment = gateway.create_payment(&request).await?;
//! // redirect the buyer to payment.redirect_url, then poll:
//! let payment = gateway.get_payment(&payment.payment_id).await?;
//! ```

mod client;
pub mod types;

pub use client::PlanetPayClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Planet Pay API.
#[derive(Debug, Error)]
pub enum PlanetPayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication with the gateway failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Payment not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Notification signature verification failed.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planetpay_error_display() {
        let err = PlanetPayError::NotFound("payment PAY-1".to_string());
        assert_eq!(err.to_string(), "Not found: payment PAY-1");

        let err = PlanetPayError::AuthenticationFailed("bad client secret".to_string());
        assert_eq!(err.to_string(), "Authentication failed: bad client secret");
    }
}
