//! Refund a payment at the gateway.

use makrama_core::PaymentId;
use tracing::info;

use super::{Clients, CliError};

/// Refund a payment, fully or partially. The amount is in minor units
/// (grosze), matching what the gateway captured.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the gateway
/// rejects the refund.
pub async fn run(id: &str, amount: i64) -> Result<(), CliError> {
    let clients = Clients::from_env()?;
    let refund = clients
        .planetpay
        .refund_payment(&PaymentId::new(id), amount)
        .await?;

    info!(
        refund = %refund.refund_id,
        status = ?refund.status,
        amount = refund.amount,
        "refund accepted"
    );
    Ok(())
}
