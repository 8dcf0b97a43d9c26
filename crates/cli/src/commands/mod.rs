//! CLI command implementations.

pub mod cancel;
pub mod check;
pub mod order;
pub mod payment;
pub mod refund;

use makrama_storefront::blpaczka::{BlPaczkaClient, BlPaczkaError};
use makrama_storefront::config::{ConfigError, StorefrontConfig};
use makrama_storefront::planetpay::{PlanetPayClient, PlanetPayError};
use makrama_storefront::woo::{CatalogClient, OrdersClient, WooError};

/// Upstream clients built from the storefront's own configuration.
pub struct Clients {
    pub catalog: CatalogClient,
    pub orders: OrdersClient,
    pub planetpay: PlanetPayClient,
    pub blpaczka: BlPaczkaClient,
}

/// Errors shared by the commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Woo(#[from] WooError),

    #[error(transparent)]
    PlanetPay(#[from] PlanetPayError),

    #[error(transparent)]
    BlPaczka(#[from] BlPaczkaError),

    #[error("{failed} of {total} upstream checks failed")]
    ChecksFailed { failed: usize, total: usize },
}

impl Clients {
    /// Build all clients from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, CliError> {
        dotenvy::dotenv().ok();

        let config = StorefrontConfig::from_env()?;
        Ok(Self {
            catalog: CatalogClient::new(&config.woo),
            orders: OrdersClient::new(&config.woo),
            planetpay: PlanetPayClient::new(&config.planetpay),
            blpaczka: BlPaczkaClient::new(&config.blpaczka)?,
        })
    }
}
