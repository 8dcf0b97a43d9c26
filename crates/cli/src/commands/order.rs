//! Fetch a single order through the privileged v3 client and print it.

use makrama_core::OrderId;
use makrama_storefront::services::checkout::meta_keys;
use tracing::info;

use super::{Clients, CliError};

/// Fetch an order by numeric id and log its state, totals and the
/// checkout metadata the storefront attaches during order placement.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the order cannot
/// be fetched.
pub async fn run(id: i64) -> Result<(), CliError> {
    let clients = Clients::from_env()?;
    let order = clients.orders.get_order(OrderId::new(id)).await?;

    info!(
        order = %order.id,
        number = %order.number,
        status = %order.status,
        total = %order.total,
        currency = %order.currency,
        "order"
    );
    info!(
        email = order.billing.email.as_deref().unwrap_or("-"),
        "billing: {} {}",
        order.billing.first_name,
        order.billing.last_name
    );

    for item in &order.line_items {
        info!(
            product = %item.product_id,
            quantity = item.quantity,
            total = %item.total,
            "line: {}",
            item.name
        );
    }

    if let Some(payment_id) = order.meta_str(meta_keys::PAYMENT_ID) {
        info!(payment_id, "payment");
    }
    if let Some(shipment_id) = order.meta_str(meta_keys::SHIPMENT_ID) {
        let tracking = order.meta_str(meta_keys::TRACKING_NUMBER).unwrap_or("-");
        let courier = order.meta_str(meta_keys::COURIER_CODE).unwrap_or("-");
        info!(shipment_id, tracking, courier, "shipment");
    }

    Ok(())
}
