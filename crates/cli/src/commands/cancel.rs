//! Cancel an in-flight payment at the gateway.

use makrama_core::PaymentId;
use tracing::info;

use super::{Clients, CliError};

/// Cancel a payment that has not completed. Final payments cannot be
/// cancelled; refund those instead.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the payment is
/// already final.
pub async fn run(id: &str) -> Result<(), CliError> {
    let clients = Clients::from_env()?;
    let payment = clients.planetpay.cancel_payment(&PaymentId::new(id)).await?;

    info!(
        payment = %payment.payment_id,
        status = ?payment.status,
        "payment cancelled"
    );
    Ok(())
}
