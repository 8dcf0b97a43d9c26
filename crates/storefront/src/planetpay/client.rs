//! Planet Pay API client implementation.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use makrama_core::PaymentId;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::Sha256;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::PlanetPayConfig;
use crate::planetpay::PlanetPayError;
use crate::planetpay::types::{AccessToken, Payment, PaymentRequest, Refund};

/// Maximum notification age in seconds (replay protection).
const NOTIFICATION_MAX_AGE_SECS: i64 = 300;

/// Request body for the auth endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

/// Response from the auth endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
}

/// Client for the Planet Pay payments API.
///
/// # Authentication
///
/// Uses OAuth client-credentials tokens. Tokens are cached in memory and
/// re-fetched automatically when within 60 seconds of expiry.
#[derive(Clone)]
pub struct PlanetPayClient {
    inner: Arc<PlanetPayClientInner>,
}

struct PlanetPayClientInner {
    client: reqwest::Client,
    config: PlanetPayConfig,
    /// In-memory token cache
    token: RwLock<Option<AccessToken>>,
}

impl PlanetPayClient {
    /// Create a new Planet Pay API client without a token.
    ///
    /// The first API call authorizes lazily; call [`Self::authorize`] to
    /// verify credentials eagerly.
    #[must_use]
    pub fn new(config: &PlanetPayConfig) -> Self {
        Self {
            inner: Arc::new(PlanetPayClientInner {
                client: reqwest::Client::builder()
                    .timeout(Duration::from_secs(30))
                    .build()
                    .expect("Failed to create HTTP client"),
                config: config.clone(),
                token: RwLock::new(None),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.config.base_url)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Obtain a fresh token and cache it.
    ///
    /// # Errors
    ///
    /// Returns `PlanetPayError::AuthenticationFailed` if the gateway rejects
    /// the client credentials.
    #[instrument(skip(self))]
    pub async fn authorize(&self) -> Result<(), PlanetPayError> {
        let token = self.fetch_token().await?;
        *self.inner.token.write().await = Some(token);
        debug!("Planet Pay token refreshed");
        Ok(())
    }

    async fn fetch_token(&self) -> Result<AccessToken, PlanetPayError> {
        let now = chrono::Utc::now().timestamp();

        let response = self
            .inner
            .client
            .post(self.url("/v1/auth/token"))
            .json(&AuthRequest {
                client_id: &self.inner.config.client_id,
                client_secret: self.inner.config.client_secret.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let auth: AuthResponse = response.json().await?;
            Ok(AccessToken {
                token: SecretString::from(auth.access_token),
                expires_at: now + auth.expires_in,
            })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(PlanetPayError::AuthenticationFailed(format!(
                "HTTP {status}: {}",
                error_text.chars().take(200).collect::<String>()
            )))
        }
    }

    /// Return a valid bearer token, refreshing the cached one if needed.
    async fn bearer(&self) -> Result<SecretString, PlanetPayError> {
        if let Some(token) = self.inner.token.read().await.as_ref()
            && !token.is_expired()
        {
            return Ok(token.token.clone());
        }

        let token = self.fetch_token().await?;
        let bearer = token.token.clone();
        *self.inner.token.write().await = Some(token);
        Ok(bearer)
    }

    /// Apply bearer auth, send, and parse the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PlanetPayError> {
        let bearer = self.bearer().await?;

        let response = request
            .bearer_auth(bearer.expose_secret())
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlanetPayError::AuthenticationFailed(
                error_text.chars().take(200).collect(),
            ));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Planet Pay returned non-success status"
            );
            return Err(PlanetPayError::Api {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        match serde_json::from_str(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Planet Pay response"
                );
                Err(PlanetPayError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Create a payment for an order.
    ///
    /// The returned payment carries the `redirect_url` of the hosted payment
    /// page the buyer must be sent to.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the request.
    #[instrument(skip(self, request), fields(external_id = %request.external_id, amount = request.amount))]
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, PlanetPayError> {
        self.send(
            self.inner
                .client
                .post(self.url("/v1/payments"))
                .json(request),
        )
        .await
    }

    /// Fetch a payment's current state (the polling primitive).
    ///
    /// # Errors
    ///
    /// Returns `PlanetPayError::NotFound` if the gateway does not know the id.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn get_payment(&self, id: &PaymentId) -> Result<Payment, PlanetPayError> {
        let url = self.url(&format!("/v1/payments/{id}"));
        match self.send(self.inner.client.get(&url)).await {
            Err(PlanetPayError::Api { status: 404, .. }) => {
                Err(PlanetPayError::NotFound(format!("Payment not found: {id}")))
            }
            other => other,
        }
    }

    /// Refund a payment, fully or partially. Amount is minor units.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the refund.
    #[instrument(skip(self), fields(payment_id = %id, amount = amount))]
    pub async fn refund_payment(
        &self,
        id: &PaymentId,
        amount: i64,
    ) -> Result<Refund, PlanetPayError> {
        let url = self.url(&format!("/v1/payments/{id}/refund"));
        self.send(
            self.inner
                .client
                .post(&url)
                .json(&serde_json::json!({ "amount": amount })),
        )
        .await
    }

    /// Cancel a payment that has not completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is already final.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn cancel_payment(&self, id: &PaymentId) -> Result<Payment, PlanetPayError> {
        let url = self.url(&format!("/v1/payments/{id}/cancel"));
        self.send(self.inner.client.post(&url)).await
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Verify a payment notification's HMAC signature.
    ///
    /// The gateway signs `"{timestamp}.{body}"` with the shared notification
    /// secret (HMAC-SHA256, hex). Notifications older than five minutes are
    /// rejected to prevent replay.
    ///
    /// # Arguments
    ///
    /// * `timestamp` - The `X-PP-Timestamp` header value (Unix seconds)
    /// * `body` - The raw request body
    /// * `signature` - The `X-PP-Signature` header value
    ///
    /// # Errors
    ///
    /// Returns `PlanetPayError::InvalidSignature` if verification fails.
    #[instrument(skip(self, body, signature))]
    pub fn verify_notification(
        &self,
        timestamp: &str,
        body: &str,
        signature: &str,
    ) -> Result<(), PlanetPayError> {
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| PlanetPayError::InvalidSignature("Invalid timestamp".to_string()))?;

        let now = chrono::Utc::now().timestamp();

        if (now - ts).abs() > NOTIFICATION_MAX_AGE_SECS {
            return Err(PlanetPayError::InvalidSignature(
                "Notification timestamp too old".to_string(),
            ));
        }

        let payload = format!("{timestamp}.{body}");

        let mut mac = Hmac::<Sha256>::new_from_slice(
            self.inner
                .config
                .notification_secret
                .expose_secret()
                .as_bytes(),
        )
        .map_err(|e| PlanetPayError::InvalidSignature(e.to_string()))?;

        mac.update(payload.as_bytes());

        let expected = hex::encode(mac.finalize().into_bytes());

        // Constant-time comparison
        if !constant_time_compare(&expected, signature) {
            return Err(PlanetPayError::InvalidSignature(
                "Signature mismatch".to_string(),
            ));
        }

        debug!("Planet Pay notification signature verified");

        Ok(())
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_client() -> PlanetPayClient {
        PlanetPayClient::new(&PlanetPayConfig {
            base_url: "https://api.planetpay.pl".to_string(),
            client_id: "client".to_string(),
            client_secret: SecretString::from("client-secret"),
            merchant_id: "merchant-1".to_string(),
            notification_secret: SecretString::from("notification-signing-key"),
        })
    }

    fn sign(secret: &str, timestamp: &str, body: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{body}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("hello", "helloo"));
    }

    #[test]
    fn test_notification_verification_valid() {
        let client = test_client();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let body = r#"{"paymentId":"PAY-77","externalId":"1042","status":"COMPLETED"}"#;
        let signature = sign("notification-signing-key", &timestamp, body);

        assert!(
            client
                .verify_notification(&timestamp, body, &signature)
                .is_ok()
        );
    }

    #[test]
    fn test_notification_verification_tampered_body() {
        let client = test_client();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let body = r#"{"paymentId":"PAY-77","externalId":"1042","status":"COMPLETED"}"#;
        let signature = sign("notification-signing-key", &timestamp, body);

        let tampered = r#"{"paymentId":"PAY-77","externalId":"1042","status":"REJECTED"}"#;
        let result = client.verify_notification(&timestamp, tampered, &signature);
        assert!(matches!(result, Err(PlanetPayError::InvalidSignature(_))));
    }

    #[test]
    fn test_notification_verification_invalid_timestamp() {
        let client = test_client();
        let result = client.verify_notification("not-a-number", "body", "sig");
        assert!(matches!(result, Err(PlanetPayError::InvalidSignature(_))));
    }

    #[test]
    fn test_notification_verification_old_timestamp() {
        let client = test_client();
        let old = (chrono::Utc::now().timestamp() - 600).to_string();
        let body = "{}";
        let signature = sign("notification-signing-key", &old, body);

        let result = client.verify_notification(&old, body, &signature);
        assert!(matches!(result, Err(PlanetPayError::InvalidSignature(_))));
    }
}
