//! WooCommerce v3 orders client.
//!
//! The privileged side of the WooCommerce integration: order creation, order
//! reads, status updates, and the payment gateway list. Authenticated with
//! the v3 consumer key/secret over HTTP basic auth; never exposed to the
//! browser.

use std::sync::Arc;

use makrama_core::{OrderId, OrderStatus};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::config::WooConfig;
use crate::woo::WooError;
use crate::woo::types::{MetaData, Order, OrderDraft, PaymentGateway};

/// Client for the WooCommerce v3 REST API.
#[derive(Clone)]
pub struct OrdersClient {
    inner: Arc<OrdersClientInner>,
}

struct OrdersClientInner {
    client: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: SecretString,
}

impl OrdersClient {
    /// Create a new v3 API client.
    #[must_use]
    pub fn new(config: &WooConfig) -> Self {
        Self {
            inner: Arc::new(OrdersClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
            }),
        }
    }

    fn v3_url(&self, path: &str) -> String {
        format!("{}/wp-json/wc/v3{path}", self.inner.base_url)
    }

    /// Apply basic auth, send, and parse the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, WooError> {
        let response = request
            .basic_auth(
                &self.inner.consumer_key,
                Some(self.inner.consumer_secret.expose_secret()),
            )
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(WooError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "WooCommerce v3 returned non-success status"
            );
            return Err(WooError::Api {
                status: status.as_u16(),
                message: super::api_error_message(&response_text),
            });
        }

        match serde_json::from_str(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse WooCommerce v3 response"
                );
                Err(WooError::Parse(e))
            }
        }
    }

    /// Create an order. WooCommerce computes all totals; the order is
    /// created in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the draft or the request fails.
    #[instrument(skip(self, draft), fields(lines = draft.line_items.len()))]
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<Order, WooError> {
        let url = self.v3_url("/orders");
        self.send(self.inner.client.post(&url).json(draft)).await
    }

    /// Fetch an order by id.
    ///
    /// Callers must verify the order's `order_key` before showing it to an
    /// anonymous visitor.
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotFound` if no such order exists.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, WooError> {
        let url = self.v3_url(&format!("/orders/{id}"));
        match self.send(self.inner.client.get(&url)).await {
            Err(WooError::Api { status: 404, .. }) => {
                Err(WooError::NotFound(format!("Order not found: {id}")))
            }
            other => other,
        }
    }

    /// Update an order's status, optionally attaching meta entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update or the request fails.
    #[instrument(skip(self, meta), fields(id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        meta: Vec<MetaData>,
    ) -> Result<Order, WooError> {
        let mut body = serde_json::json!({ "status": status });
        if !meta.is_empty()
            && let Some(obj) = body.as_object_mut()
        {
            obj.insert("meta_data".to_string(), serde_json::to_value(&meta)?);
        }

        let url = self.v3_url(&format!("/orders/{id}"));
        self.send(self.inner.client.put(&url).json(&body)).await
    }

    /// List enabled payment gateways.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_payment_gateways(&self) -> Result<Vec<PaymentGateway>, WooError> {
        let url = self.v3_url("/payment_gateways");
        let gateways: Vec<PaymentGateway> = self.send(self.inner.client.get(&url)).await?;
        Ok(gateways.into_iter().filter(|g| g.enabled).collect())
    }
}
