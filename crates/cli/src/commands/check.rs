//! Probe every upstream service and report per-service status.

use tracing::{error, info};

use super::{Clients, CliError};

/// Run connectivity checks against all configured upstreams.
///
/// Each probe exercises the credential that service actually requires:
/// the Store API is public, the v3 API needs the consumer key pair,
/// Planet Pay needs a client-credentials token and BLPaczka needs the
/// API key header.
///
/// # Errors
///
/// Returns [`CliError::ChecksFailed`] when any probe fails, so the
/// process exits non-zero.
pub async fn run() -> Result<(), CliError> {
    let clients = Clients::from_env()?;

    let mut failed = 0;
    let total = 4;

    match clients.catalog.ping().await {
        Ok(()) => info!(service = "woo-store-api", "ok"),
        Err(e) => {
            failed += 1;
            error!(service = "woo-store-api", error = %e, "check failed");
        }
    }

    match clients.orders.list_payment_gateways().await {
        Ok(gateways) => info!(service = "woo-v3", gateways = gateways.len(), "ok"),
        Err(e) => {
            failed += 1;
            error!(service = "woo-v3", error = %e, "check failed");
        }
    }

    match clients.planetpay.authorize().await {
        Ok(()) => info!(service = "planetpay", "ok"),
        Err(e) => {
            failed += 1;
            error!(service = "planetpay", error = %e, "check failed");
        }
    }

    match clients.blpaczka.ping().await {
        Ok(()) => info!(service = "blpaczka", "ok"),
        Err(e) => {
            failed += 1;
            error!(service = "blpaczka", error = %e, "check failed");
        }
    }

    if failed > 0 {
        return Err(CliError::ChecksFailed { failed, total });
    }

    info!("all {total} upstream checks passed");
    Ok(())
}
