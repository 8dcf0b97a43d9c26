//! BLPaczka API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::blpaczka::BlPaczkaError;
use crate::blpaczka::types::{
    CourierOffer, CourierQuery, PickupPoint, Shipment, ShipmentRequest, Valuation,
};
use crate::config::BlPaczkaConfig;

/// Valuation request body; the courier code rides alongside the offer query.
#[derive(Serialize)]
struct ValuationRequest<'a> {
    courier_code: &'a str,
    #[serde(flatten)]
    query: &'a CourierQuery,
}

/// Client for the BLPaczka parcel broker API.
#[derive(Clone)]
pub struct BlPaczkaClient {
    inner: Arc<BlPaczkaClientInner>,
}

struct BlPaczkaClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BlPaczkaClient {
    /// Create a new BLPaczka client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &BlPaczkaConfig) -> Result<Self, BlPaczkaError> {
        let mut headers = HeaderMap::new();

        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| BlPaczkaError::InvalidApiKey(e.to_string()))?;
        api_key.set_sensitive(true);
        headers.insert("X-Api-Key", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(BlPaczkaClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and parse the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BlPaczkaError> {
        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "BLPaczka returned non-success status"
            );
            return Err(BlPaczkaError::Api {
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
                    "Failed to parse BLPaczka response"
                );
                Err(BlPaczkaError::Parse(e))
            }
        }
    }

    /// Courier offers for a parcel between two postcodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, query), fields(receiver = %query.receiver_postcode))]
    pub async fn find_couriers(
        &self,
        query: &CourierQuery,
    ) -> Result<Vec<CourierOffer>, BlPaczkaError> {
        self.send(
            self.inner
                .client
                .post(self.url("/v1/couriers/find"))
                .json(query),
        )
        .await
    }

    /// Authoritative price for a courier; checkout never trusts form prices.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, query), fields(courier = courier_code))]
    pub async fn valuate(
        &self,
        courier_code: &str,
        query: &CourierQuery,
    ) -> Result<Valuation, BlPaczkaError> {
        self.send(
            self.inner
                .client
                .post(self.url("/v1/valuation"))
                .json(&ValuationRequest {
                    courier_code,
                    query,
                }),
        )
        .await
    }

    /// Pickup points of a provider near a postcode.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_pickup_points(
        &self,
        provider: &str,
        postcode: &str,
    ) -> Result<Vec<PickupPoint>, BlPaczkaError> {
        self.send(
            self.inner
                .client
                .get(self.url("/v1/pickup-points"))
                .query(&[("provider", provider), ("postcode", postcode)]),
        )
        .await
    }

    /// Book a shipment for a placed order.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker rejects the booking.
    #[instrument(
        skip(self, request),
        fields(courier = %request.courier_code, reference = request.reference.as_deref().unwrap_or(""))
    )]
    pub async fn create_shipment(
        &self,
        request: &ShipmentRequest,
    ) -> Result<Shipment, BlPaczkaError> {
        self.send(
            self.inner
                .client
                .post(self.url("/v1/shipments"))
                .json(request),
        )
        .await
    }

    /// Connectivity and API key probe, used by readiness checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unreachable or rejects the key.
    pub async fn ping(&self) -> Result<(), BlPaczkaError> {
        let _: Vec<serde_json::Value> = self
            .send(self.inner.client.get(self.url("/v1/couriers")))
            .await?;
        Ok(())
    }
}
