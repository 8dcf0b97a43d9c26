//! Planet Pay wire types.
//!
//! The gateway API is camelCase JSON; amounts are minor units.

use makrama_core::{PaymentChannel, PaymentId, PaymentStatus};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Bearer token obtained from the gateway's auth endpoint.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Bearer token for API requests.
    pub token: SecretString,
    /// Unix timestamp when the token expires.
    pub expires_at: i64,
}

impl AccessToken {
    /// Check if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        // Consider expired if less than 60 seconds remaining
        now >= self.expires_at - 60
    }
}

/// Payload for creating a payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub merchant_id: String,
    /// Amount in minor units (grosze for PLN).
    pub amount: i64,
    pub currency: String,
    /// The shop-side order reference (WooCommerce order id).
    pub external_id: String,
    pub description: String,
    pub buyer: Buyer,
    pub channel: PaymentChannel,
    /// Where the gateway sends the buyer after the hosted payment page.
    pub return_url: String,
    /// Where the gateway posts server-to-server status notifications.
    pub notification_url: String,
}

/// Buyer details attached to a payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub email: String,
}

/// A payment as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    /// Hosted payment page URL; present while the payment awaits the buyer.
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub external_id: String,
}

/// A refund as returned by `POST /v1/payments/{id}/refund`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub refund_id: String,
    #[serde(default)]
    pub amount: i64,
    pub status: PaymentStatus,
}

/// Body of a server-to-server payment notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotification {
    pub payment_id: PaymentId,
    /// The shop-side order reference the payment was created with.
    pub external_id: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
}
