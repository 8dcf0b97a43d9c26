//! Application state shared across handlers.

use std::sync::Arc;

use crate::blpaczka::{BlPaczkaClient, BlPaczkaError};
use crate::config::StorefrontConfig;
use crate::planetpay::PlanetPayClient;
use crate::woo::{CatalogClient, OrdersClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// upstream API clients and configuration. The storefront holds no database;
/// all durable state lives in WooCommerce.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    orders: OrdersClient,
    planetpay: PlanetPayClient,
    blpaczka: BlPaczkaClient,
}

impl AppState {
    /// Create a new application state with clients built from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the BLPaczka API key cannot be used as a header.
    pub fn new(config: StorefrontConfig) -> Result<Self, BlPaczkaError> {
        let catalog = CatalogClient::new(&config.woo);
        let orders = OrdersClient::new(&config.woo);
        let planetpay = PlanetPayClient::new(&config.planetpay);
        let blpaczka = BlPaczkaClient::new(&config.blpaczka)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                orders,
                planetpay,
                blpaczka,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the WooCommerce Store API client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the WooCommerce v3 orders client.
    #[must_use]
    pub fn orders(&self) -> &OrdersClient {
        &self.inner.orders
    }

    /// Get a reference to the Planet Pay client.
    #[must_use]
    pub fn planetpay(&self) -> &PlanetPayClient {
        &self.inner.planetpay
    }

    /// Get a reference to the BLPaczka client.
    #[must_use]
    pub fn blpaczka(&self) -> &BlPaczkaClient {
        &self.inner.blpaczka
    }
}
