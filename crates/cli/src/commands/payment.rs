//! Look up a payment directly at the gateway.

use makrama_core::PaymentId;
use tracing::info;

use super::{Clients, CliError};

/// Fetch a payment by gateway id and log its status and amount.
///
/// Useful when a confirmation page shows an order stuck in "awaiting
/// payment" and the question is whether the gateway or the webhook is
/// at fault.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the payment
/// cannot be fetched.
pub async fn run(id: &str) -> Result<(), CliError> {
    let clients = Clients::from_env()?;
    let payment = clients.planetpay.get_payment(&PaymentId::new(id)).await?;

    info!(
        payment = %payment.payment_id,
        status = ?payment.status,
        amount = payment.amount,
        currency = %payment.currency,
        order = %payment.external_id,
        "payment"
    );
    if let Some(url) = &payment.redirect_url {
        info!(url, "redirect");
    }

    Ok(())
}
